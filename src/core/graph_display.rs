// src/core/graph_display.rs

use crate::core::base::{Model, VisitResult};
use crate::core::file_model::FileState;
use log::warn;
use std::fmt::Write as _;

/// Renders the file links below `root` as an ASCII tree, indented by `indent` spaces.
///
/// Plain (non-file) models are transparent: their file links show up as children of
/// the nearest enclosing file.
pub fn show_tree(root: &dyn Model, indent: usize) -> String {
    let mut out = String::new();
    let margin = " ".repeat(indent);
    let _ = writeln!(out, "{}{}", margin, label(root));
    render_children(root, &margin, &mut out);
    out
}

/// Recursive function to print the file children of a node and their descendants.
///
/// A child that is mutably borrowed elsewhere cannot be inspected. The listing stops
/// there and ends with a `<borrowed>` marker.
fn render_children(node: &dyn Model, prefix: &str, out: &mut String) {
    let mut count = 0;
    let counted = for_each_file_child(node, &mut |_: &dyn Model| {
        count += 1;
        Ok(())
    });
    let mut incomplete = counted.is_err();

    let mut index = 0;
    let rendered = for_each_file_child(node, &mut |child: &dyn Model| {
        index += 1;
        let is_last = index == count && !incomplete;
        let connector = if is_last { "└─" } else { "├─" };
        let _ = writeln!(out, "{}{}{}", prefix, connector, label(child));

        // Prepare the prefix for the children of this node
        let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
        render_children(child, &child_prefix, out);
        Ok(())
    });

    if let Err(e) = counted.and(rendered) {
        warn!("Tree listing is incomplete: {}", e);
        incomplete = true;
    }
    if incomplete {
        let _ = writeln!(out, "{}└─<borrowed>", prefix);
    }
}

/// Calls `visitor` for every file model directly reachable from `node`, looking through
/// plain models.
fn for_each_file_child(
    node: &dyn Model,
    visitor: &mut dyn FnMut(&dyn Model) -> VisitResult,
) -> VisitResult {
    node.visit_children(&mut |child: &dyn Model| {
        if child.as_file().is_some() {
            visitor(child)
        } else {
            for_each_file_child(child, &mut *visitor)
        }
    })
}

fn label(node: &dyn Model) -> String {
    let Some(file) = node.as_file() else {
        return "<model>".to_string();
    };
    let info = file.info();
    let type_name = file
        .model_type()
        .rsplit("::")
        .next()
        .unwrap_or_default();
    let name = info
        .filepath
        .as_ref()
        .map_or_else(|| "<unnamed>".to_string(), |path| path.display().to_string());
    let location = info
        .save_location()
        .map_or_else(|| "in memory".to_string(), |path| path.display().to_string());
    let marker = if info.state == FileState::Deferred {
        " (deferred)"
    } else {
        ""
    };
    format!("{} ({}) [{}]{}", name, type_name, location, marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file_model::{FileInfo, FileLink};
    use crate::core::test_models::{ChildModel, MidModel, RootModel};

    #[test]
    fn test_show_tree_renders_file_links() {
        let mut root = RootModel::with_children(&["a.ini", "b.ini"]);
        root.file = FileInfo {
            filepath: Some("root.root".into()),
            absolute_anchor_path: Some("/case".into()),
            ..Default::default()
        };
        let mut mid = MidModel::default();
        mid.file.filepath = Some("mid/mid.mid".into());
        mid.child_file = Some(FileLink::new(ChildModel::default()));
        root.files.mid_file = Some(FileLink::new(mid));

        let tree = root.show_tree(2);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines[0], "  root.root (RootModel) [/case/root.root]");
        assert!(lines[1].starts_with("  ├─mid/mid.mid (MidModel)"));
        assert!(lines[2].starts_with("  │  └─<unnamed> (ChildModel) [in memory]"));
        assert!(lines[3].starts_with("  ├─a.ini (ChildModel)"));
        assert!(lines[4].starts_with("  └─b.ini (ChildModel)"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_borrowed_child_is_marked() {
        let root = RootModel::with_children(&["a.ini", "b.ini"]);
        let b = root.files.extra_files[1].clone();
        let _guard = b.borrow_mut();

        let tree = root.show_tree(0);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines[0], "<unnamed> (RootModel) [in memory]");
        assert!(lines[1].starts_with("├─a.ini (ChildModel)"));
        assert_eq!(lines[2], "└─<borrowed>");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_plain_model_root() {
        let general = crate::core::test_models::General::default();
        assert_eq!(show_tree(&general, 0), "<model>\n");
    }
}
