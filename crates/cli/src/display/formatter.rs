use modmove_core::{
    ConflictReport, EditPlan, Position, Program, Visibility,
    interfaces::ModuleTreeQuery,
    model::ModuleKind,
    types::ModuleId,
};

/// Source-level spelling of a resolved visibility
pub fn visibility_label(program: &Program, visibility: Visibility) -> String {
    match visibility {
        Visibility::Public => "pub".to_string(),
        Visibility::Private => "private".to_string(),
        Visibility::Restricted(scope) if program.parent_of(scope).is_none() => {
            "pub(crate)".to_string()
        }
        Visibility::Restricted(scope) => format!("pub(in {})", program.module_path(scope)),
    }
}

pub fn print_report(report: &ConflictReport) {
    if report.is_empty() {
        println!("✅ No conflicts");
    } else {
        println!("⚠️  {} conflicting element(s):", report.len());
        for (key, messages) in report.iter() {
            println!("  {}@{} `{}`", key.file.display(), key.offset, key.text);
            for message in messages {
                println!("    - {message}");
            }
        }
    }
    if report.must_publicize {
        println!("🔓 The module declaration must become `pub`");
    }
}

pub fn print_plan(program: &Program, plan: &EditPlan) {
    if let Some(file_move) = plan.file_move() {
        println!(
            "📦 {} -> {}",
            file_move.from.display(),
            file_move.to.display()
        );
    }
    for file in plan.edited_files() {
        println!("\n📝 {}", file.display());
        let text = program.workspace().file_text(file).unwrap_or_default();
        for edit in plan.edits_for(file) {
            let position = Position::from_offset(text, edit.range.start);
            let old = edit.range.slice(text);
            let label = match (old.is_empty(), edit.text.is_empty()) {
                (true, _) => format!("insert {:?}", edit.text),
                (false, true) => format!("delete {old:?}"),
                (false, false) => format!("replace {old:?} with {:?}", edit.text),
            };
            println!("  {}:{}  {}", position.line + 1, position.character + 1, label);
        }
    }
}

pub fn print_tree(program: &Program) {
    for root in program.crate_roots() {
        let file = &program.file(program.module(root).file).path;
        println!("📦 crate ({})", file.display());
        print_children(program, root, 1);
    }
}

fn print_children(program: &Program, module: ModuleId, depth: usize) {
    let mut children = program.child_modules(module);
    children.sort_by(|a, b| program.module(*a).name.cmp(&program.module(*b).name));

    for child in children {
        let data = program.module(child);
        let location = match data.kind {
            ModuleKind::Inline => "inline".to_string(),
            _ => program.file(data.file).path.display().to_string(),
        };
        println!(
            "{}{} [{}] {}",
            "  ".repeat(depth),
            data.name,
            visibility_label(program, data.visibility),
            location
        );
        print_children(program, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmove_core::Workspace;

    #[test]
    fn test_visibility_label() {
        let workspace = Workspace::new(".")
            .with_crate_root("src/lib.rs")
            .with_file("src/lib.rs", "pub mod a { pub(crate) mod b {} pub(super) mod c {} }");
        let program = Program::from_workspace(workspace).unwrap();
        let root = program.crate_roots().next().unwrap();
        let a = program.module_by_path(root, "crate::a").unwrap();

        let labels: Vec<String> = ["crate::a", "crate::a::b"]
            .iter()
            .map(|path| program.module_by_path(root, path).unwrap())
            .map(|m| visibility_label(&program, program.module(m).visibility))
            .collect();
        assert_eq!(labels, vec!["pub", "pub(crate)"]);
        assert_eq!(
            visibility_label(&program, Visibility::Restricted(a)),
            "pub(in crate::a)"
        );
    }
}
