// src/ini/values.rs

//! Conversion between raw INI strings and typed field values.

use crate::ini::serializer::SerializerConfig;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::path::PathBuf;

lazy_static! {
    // One whitespace/comma/semicolon separated token.
    static ref TOKEN_RE: Regex = Regex::new(r"[^\s,;]+").unwrap();
    // A float written with a Fortran exponent marker, e.g. `1.5d-3` or `2D+04`.
    static ref FORTRAN_FLOAT_RE: Regex =
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)[dD][+-]?\d+$").unwrap();
}

/// Rewrites Fortran-style exponents (`d`/`D`) to the standard `e`/`E` form.
///
/// Only tokens that are entirely a number are rewritten, so names such as
/// `grid2d_net.nc` pass through untouched.
pub fn normalize_scientific_notation(value: &str) -> Cow<'_, str> {
    if !value.contains(['d', 'D']) {
        return Cow::Borrowed(value);
    }
    TOKEN_RE.replace_all(value, |caps: &Captures<'_>| {
        let token = caps.get(0).map_or("", |m| m.as_str());
        if FORTRAN_FLOAT_RE.is_match(token) {
            token.replace('d', "e").replace('D', "E")
        } else {
            token.to_string()
        }
    })
}

/// Splits a list value on `delimiter`. A blank delimiter splits on any whitespace run.
pub fn split_list<'a>(value: &'a str, delimiter: &str) -> Vec<&'a str> {
    if delimiter.trim().is_empty() {
        value.split_whitespace().collect()
    } else {
        value
            .split(delimiter)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// A value that can be read from and written to a single INI property.
pub trait IniValue: Sized {
    /// Parses the raw (already trimmed) value. The error is a human-readable reason.
    fn from_ini(raw: &str) -> Result<Self, String>;

    fn to_ini(&self, config: &SerializerConfig) -> String;
}

impl IniValue for String {
    fn from_ini(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }

    fn to_ini(&self, _config: &SerializerConfig) -> String {
        self.clone()
    }
}

impl IniValue for bool {
    fn from_ini(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
            "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
            other => Err(format!("'{}' is not a boolean (expected 0 or 1)", other)),
        }
    }

    fn to_ini(&self, _config: &SerializerConfig) -> String {
        if *self { "1" } else { "0" }.to_string()
    }
}

macro_rules! impl_ini_integer {
    ($($ty:ty),*) => {
        $(
            impl IniValue for $ty {
                fn from_ini(raw: &str) -> Result<Self, String> {
                    raw.trim()
                        .parse::<$ty>()
                        .map_err(|e| format!("'{}' is not a valid {}: {}", raw, stringify!($ty), e))
                }

                fn to_ini(&self, _config: &SerializerConfig) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_ini_integer!(i32, i64, u32, u64, usize);

impl IniValue for f64 {
    fn from_ini(raw: &str) -> Result<Self, String> {
        let normalized = normalize_scientific_notation(raw.trim());
        normalized
            .parse::<f64>()
            .map_err(|e| format!("'{}' is not a valid float: {}", raw, e))
    }

    fn to_ini(&self, config: &SerializerConfig) -> String {
        format_float(*self, config.float_precision)
    }
}

impl IniValue for PathBuf {
    fn from_ini(raw: &str) -> Result<Self, String> {
        Ok(PathBuf::from(raw))
    }

    fn to_ini(&self, _config: &SerializerConfig) -> String {
        self.to_string_lossy().into_owned()
    }
}

/// Formats a float with a fixed precision, or in the shortest form that reads back
/// to the same value (switching to exponent notation for very small/large magnitudes).
pub fn format_float(value: f64, precision: Option<usize>) -> String {
    if let Some(precision) = precision {
        return format!("{:.*}", precision, value);
    }
    let magnitude = value.abs();
    if value != 0.0 && magnitude.is_finite() && !(1e-4..1e15).contains(&magnitude) {
        format!("{:e}", value)
    } else {
        format!("{}", value)
    }
}
