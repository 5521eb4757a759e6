//! End-to-end moves over in-memory workspaces

use modmove_core::{
    AlwaysConfirm, CancelToken, Error, MoveConfig, MoveEngine, MoveOutcome, MoveRequest,
    MoveState, NoProgress, PreconditionError, Program, Result, Workspace,
};
use std::path::{Path, PathBuf};

fn crate_with(files: &[(&str, &str)]) -> Workspace {
    let mut workspace = Workspace::new(".").with_crate_root("src/lib.rs");
    for (path, text) in files {
        workspace.insert_file(path, *text);
    }
    workspace
}

fn run_move(workspace: Workspace, file: &str, target: &str) -> Result<(MoveOutcome, Workspace)> {
    let engine = MoveEngine::new(MoveConfig::default())?;
    engine.execute(workspace, Path::new(file), target, &AlwaysConfirm, &NoProgress)
}

fn text<'w>(workspace: &'w Workspace, path: &str) -> &'w str {
    workspace
        .file_text(Path::new(path))
        .unwrap_or_else(|| panic!("{path} is missing"))
}

/// Targets of the outermost paths of a file, sorted
fn outermost_targets(program: &Program, path: &str) -> Vec<String> {
    let file = program.file_id(Path::new(path)).unwrap();
    let mut targets: Vec<String> = program
        .refs_in_file(file)
        .filter(|&r| program.reference(r).parent.is_none())
        .filter_map(|r| program.reference(r).target)
        .map(|t| program.target_path(t))
        .collect();
    targets.sort();
    targets
}

fn scenario() -> Workspace {
    crate_with(&[
        ("src/lib.rs", "pub mod a;\npub mod c;\n"),
        ("src/a.rs", "pub mod b;\npub mod x;\n"),
        (
            "src/a/b.rs",
            "pub struct Thing;\n\npub fn helper() -> Thing {\n    super::x::make()\n}\n",
        ),
        (
            "src/a/x.rs",
            "pub fn make() -> super::b::Thing {\n    super::b::Thing\n}\n",
        ),
        (
            "src/c.rs",
            "pub fn consume() -> crate::a::b::Thing {\n    crate::a::b::helper()\n}\n",
        ),
    ])
}

#[test]
fn test_move_into_sibling_rewrites_every_path() -> Result<()> {
    let (outcome, moved) = run_move(scenario(), "src/a/b.rs", "crate::c")?;

    assert_eq!(outcome.state, MoveState::Done);
    assert!(outcome.report.is_empty());
    assert_eq!(outcome.new_path, Some(PathBuf::from("src/c/b.rs")));
    assert!(!moved.contains(Path::new("src/a/b.rs")));

    assert_eq!(text(&moved, "src/a.rs"), "pub mod x;\n");
    assert_eq!(
        text(&moved, "src/a/x.rs"),
        "pub fn make() -> crate::c::b::Thing {\n    crate::c::b::Thing\n}\n"
    );
    assert_eq!(
        text(&moved, "src/c.rs"),
        "pub mod b;\n\npub fn consume() -> crate::c::b::Thing {\n    crate::c::b::helper()\n}\n"
    );
    assert_eq!(
        text(&moved, "src/c/b.rs"),
        "pub struct Thing;\n\npub fn helper() -> Thing {\n    crate::a::x::make()\n}\n"
    );
    Ok(())
}

#[test]
fn test_super_chains_keep_their_targets() -> Result<()> {
    let before = Program::from_workspace(scenario())?;
    let (_, moved) = run_move(scenario(), "src/a/b.rs", "crate::c")?;
    let after = Program::from_workspace(moved)?;

    // `super::x::make` became `crate::a::x::make`
    assert_eq!(
        outermost_targets(&before, "src/a/b.rs"),
        vec!["crate::a::b::Thing", "crate::a::x::make"]
    );
    assert_eq!(
        outermost_targets(&after, "src/c/b.rs"),
        vec!["crate::a::x::make", "crate::c::b::Thing"]
    );
    Ok(())
}

#[test]
fn test_round_trip_restores_resolutions() -> Result<()> {
    let before = Program::from_workspace(scenario())?;
    let (_, there) = run_move(scenario(), "src/a/b.rs", "crate::c")?;
    let (outcome, back) = run_move(there, "src/c/b.rs", "crate::a")?;
    assert_eq!(outcome.state, MoveState::Done);

    assert_eq!(text(&back, "src/a.rs"), "pub mod x;\npub mod b;\n");
    let after = Program::from_workspace(back)?;
    for file in ["src/a/b.rs", "src/a/x.rs", "src/c.rs"] {
        assert_eq!(
            outermost_targets(&before, file),
            outermost_targets(&after, file),
            "resolutions changed in {file}"
        );
    }
    Ok(())
}

#[test]
fn test_large_groups_get_an_import() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "pub mod a;\npub mod c;\nmod pair;\nmod user;\n"),
        ("src/a.rs", "pub mod b;\n"),
        ("src/a/b.rs", "pub fn f() {}\npub fn g() {}\npub fn h() {}\n"),
        ("src/c.rs", ""),
        (
            "src/user.rs",
            "pub fn three() {\n    crate::a::b::f();\n    crate::a::b::g();\n    crate::a::b::h();\n}\n",
        ),
        (
            "src/pair.rs",
            "pub fn two() {\n    crate::a::b::f();\n    crate::a::b::g();\n}\n",
        ),
    ]);
    let (_, moved) = run_move(workspace, "src/a/b.rs", "crate::c")?;

    assert_eq!(
        text(&moved, "src/user.rs"),
        "use crate::c::b;\n\npub fn three() {\n    b::f();\n    b::g();\n    b::h();\n}\n"
    );
    assert_eq!(
        text(&moved, "src/pair.rs"),
        "pub fn two() {\n    crate::c::b::f();\n    crate::c::b::g();\n}\n"
    );
    assert_eq!(text(&moved, "src/c.rs"), "pub mod b;\n");
    Ok(())
}

#[test]
fn test_threshold_is_configurable() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "pub mod a;\npub mod c;\nmod pair;\n"),
        ("src/a.rs", "pub mod b;\n"),
        ("src/a/b.rs", "pub fn f() {}\npub fn g() {}\n"),
        ("src/c.rs", ""),
        (
            "src/pair.rs",
            "pub fn two() {\n    crate::a::b::f();\n    crate::a::b::g();\n}\n",
        ),
    ]);
    let config = MoveConfig {
        import_threshold: 1,
        ..MoveConfig::default()
    };
    let engine = MoveEngine::new(config)?;
    let (_, moved) = engine.execute(
        workspace,
        Path::new("src/a/b.rs"),
        "crate::c",
        &AlwaysConfirm,
        &NoProgress,
    )?;

    assert_eq!(
        text(&moved, "src/pair.rs"),
        "use crate::c::b;\n\npub fn two() {\n    b::f();\n    b::g();\n}\n"
    );
    Ok(())
}

#[test]
fn test_import_into_single_line_module_body() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "pub mod a;\npub mod c;\nmod user;\n"),
        ("src/a.rs", "pub mod b;\n"),
        ("src/a/b.rs", "pub fn f() {}\n"),
        ("src/c.rs", ""),
        (
            "src/user.rs",
            "mod inner { fn h() { crate::a::b::f(); crate::a::b::f(); crate::a::b::f(); } }\n",
        ),
    ]);
    let (_, moved) = run_move(workspace, "src/a/b.rs", "crate::c")?;

    assert_eq!(
        text(&moved, "src/user.rs"),
        "mod inner {\n    use crate::c::b;\n    fn h() { b::f(); b::f(); b::f(); } }\n"
    );
    Ok(())
}

#[test]
fn test_import_falls_back_when_name_is_taken() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "pub mod a;\npub mod c;\nmod user;\n"),
        ("src/a.rs", "pub mod b;\n"),
        ("src/a/b.rs", "pub fn f() {}\n"),
        ("src/c.rs", ""),
        (
            "src/user.rs",
            "fn b() {}\npub fn three() {\n    crate::a::b::f();\n    crate::a::b::f();\n    crate::a::b::f();\n}\n",
        ),
    ]);
    let (_, moved) = run_move(workspace, "src/a/b.rs", "crate::c")?;

    let user = text(&moved, "src/user.rs");
    assert!(!user.contains("use crate::c::b;"));
    assert_eq!(user.matches("crate::c::b::f()").count(), 3);
    Ok(())
}

#[test]
fn test_imports_are_retargeted_and_split_out_of_groups() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "pub mod a;\npub mod c;\nmod user;\n"),
        ("src/a.rs", "pub mod b;\npub mod x {}\n"),
        ("src/a/b.rs", "pub struct Thing;\n"),
        ("src/c.rs", ""),
        (
            "src/user.rs",
            "use crate::a::b::Thing;\nuse crate::a::{b::Thing as Other, x};\n\npub fn make() -> (Thing, Other) {\n    (Thing, Other)\n}\n",
        ),
    ]);
    let (_, moved) = run_move(workspace, "src/a/b.rs", "crate::c")?;

    assert_eq!(
        text(&moved, "src/user.rs"),
        "use crate::c::b::Thing;\nuse crate::a::{x};\nuse crate::c::b::Thing as Other;\n\npub fn make() -> (Thing, Other) {\n    (Thing, Other)\n}\n"
    );
    Ok(())
}

#[test]
fn test_restricted_scopes_are_recomputed() -> Result<()> {
    let files = [
        ("src/lib.rs", "mod a;\npub mod c;\n"),
        ("src/a.rs", "mod b;\npub mod x {}\n"),
        (
            "src/a/b.rs",
            "pub(super) fn helper() {}\npub(in crate::a) struct Local;\npub(crate) fn open() {}\n",
        ),
        ("src/c.rs", ""),
    ];

    let (_, to_sibling) = run_move(crate_with(&files), "src/a/b.rs", "crate::c")?;
    assert_eq!(
        text(&to_sibling, "src/c/b.rs"),
        "pub(crate) fn helper() {}\npub(crate) struct Local;\npub(crate) fn open() {}\n"
    );

    // the scope still covers `crate::a::x`, but `super` would now mean `x`
    let (_, to_child) = run_move(crate_with(&files), "src/a/b.rs", "crate::a::x")?;
    assert_eq!(
        text(&to_child, "src/a/x/b.rs"),
        "pub(in crate::a) fn helper() {}\npub(in crate::a) struct Local;\npub(crate) fn open() {}\n"
    );
    assert_eq!(text(&to_child, "src/a.rs"), "pub mod x {\n    mod b;\n}\n");
    Ok(())
}

#[test]
fn test_tuple_struct_pattern_reports_one_conflict() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "mod a;\nmod c;\n"),
        ("src/a.rs", "mod b;\npub struct Pair(pub i32, i32);\n"),
        (
            "src/a/b.rs",
            "pub fn split(pair: super::Pair) -> i32 {\n    let super::Pair(first, second) = pair;\n    first + second\n}\n",
        ),
        ("src/c.rs", ""),
    ]);
    let engine = MoveEngine::new(MoveConfig::default())?;
    let program = engine.snapshot(workspace)?;
    let request = engine.request(&program, Path::new("src/a/b.rs"), "crate::c")?;
    let report = engine.check(&program, request, &NoProgress)?;

    assert_eq!(report.len(), 1);
    let (key, messages) = report.iter().next().unwrap();
    assert_eq!(key.text, "super::Pair(first, second)");
    assert_eq!(messages.len(), 1);
    insta::assert_snapshot!(
        messages[0],
        @"struct `crate::a::Pair` has fields that are not accessible from `crate::c`"
    );
    Ok(())
}

#[test]
fn test_inaccessible_destination_is_reported() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "pub mod a;\nmod c;\nmod user;\n"),
        ("src/a.rs", "pub mod b;\n"),
        ("src/a/b.rs", "pub fn f() {}\n"),
        ("src/c.rs", "mod hidden {}\n"),
        ("src/user.rs", "fn g() { crate::a::b::f(); }\n"),
    ]);
    let engine = MoveEngine::new(MoveConfig::default())?;
    let program = engine.snapshot(workspace)?;
    let request = engine.request(&program, Path::new("src/a/b.rs"), "crate::c::hidden")?;
    let report = engine.check(&program, request, &NoProgress)?;

    // `user` sees `c` through the crate root but not `c::hidden`
    let messages: Vec<&str> = report.messages().collect();
    assert_eq!(
        messages,
        vec!["module `crate::c::hidden` is not accessible from `crate::user`"]
    );
    assert!(report.must_publicize);
    Ok(())
}

#[test]
fn test_private_declaration_is_publicized() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "pub mod a;\npub mod c;\nmod user;\n"),
        ("src/a.rs", "/// Docs travel along\nmod b;\npub fn g() { b::f(); }\n"),
        ("src/a/b.rs", "pub fn f() {}\n"),
        ("src/c.rs", "use std::fmt;\n"),
        ("src/user.rs", ""),
    ]);
    let (outcome, moved) = run_move(workspace, "src/a/b.rs", "crate::c")?;

    assert!(outcome.report.must_publicize);
    assert_eq!(
        text(&moved, "src/c.rs"),
        "use std::fmt;\n/// Docs travel along\npub mod b;\n"
    );
    assert_eq!(
        text(&moved, "src/a.rs"),
        "pub fn g() { crate::c::b::f(); }\n"
    );
    Ok(())
}

#[test]
fn test_function_of_the_same_name_does_not_block_the_move() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "pub mod a;\npub mod c;\nmod user;\n"),
        ("src/a.rs", "pub mod b;\n"),
        ("src/a/b.rs", "pub fn f() {}\n"),
        ("src/c.rs", "pub fn b() {}\n"),
        ("src/user.rs", "fn g() { crate::a::b::f(); crate::c::b(); }\n"),
    ]);
    let (outcome, moved) = run_move(workspace, "src/a/b.rs", "crate::c")?;

    assert_eq!(outcome.state, MoveState::Done);
    assert_eq!(text(&moved, "src/c.rs"), "pub mod b;\n\npub fn b() {}\n");
    assert_eq!(
        text(&moved, "src/user.rs"),
        "fn g() { crate::c::b::f(); crate::c::b(); }\n"
    );

    // both names resolve to their own namespace afterwards
    let program = Program::from_workspace(moved)?;
    assert_eq!(
        outermost_targets(&program, "src/user.rs"),
        vec!["crate::c::b", "crate::c::b::f"]
    );
    Ok(())
}

#[test]
fn test_zero_usages_only_moves_the_declaration() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "mod a;\npub mod c;\n"),
        ("src/a.rs", "mod b;\n"),
        ("src/a/b.rs", "fn f() {}\n"),
        ("src/c.rs", ""),
    ]);
    let (outcome, moved) = run_move(workspace, "src/a/b.rs", "crate::c")?;

    assert!(!outcome.report.must_publicize);
    assert_eq!(outcome.plan.edit_count(), 2);
    assert_eq!(text(&moved, "src/a.rs"), "");
    assert_eq!(text(&moved, "src/c.rs"), "mod b;\n");
    assert_eq!(text(&moved, "src/c/b.rs"), "fn f() {}\n");
    Ok(())
}

#[test]
fn test_mod_rs_keeps_its_layout() -> Result<()> {
    let workspace = crate_with(&[
        ("src/lib.rs", "mod a;\npub mod c;\n"),
        ("src/a.rs", "mod b;\n"),
        ("src/a/b/mod.rs", "fn f() {}\n"),
        ("src/c.rs", ""),
    ]);
    let (outcome, moved) = run_move(workspace, "src/a/b/mod.rs", "crate::c")?;

    assert_eq!(outcome.new_path, Some(PathBuf::from("src/c/b/mod.rs")));
    assert!(moved.contains(Path::new("src/c/b/mod.rs")));
    Ok(())
}

fn precondition(workspace: Workspace, request: impl Fn(&Program) -> MoveRequest) -> PreconditionError {
    let engine = MoveEngine::new(MoveConfig::default()).unwrap();
    let original = workspace.clone();
    let program = engine.snapshot(workspace).unwrap();
    let result = engine.plan(&program, request(&program), &AlwaysConfirm, &NoProgress);
    assert_eq!(program.workspace(), &original);
    match result {
        Err(Error::Precondition(error)) => error,
        other => panic!("expected a precondition error, got {other:?}"),
    }
}

fn module(program: &Program, path: &str) -> modmove_core::ModuleId {
    let root = program.crate_roots().next().unwrap();
    program.module_by_path(root, path).unwrap()
}

#[test]
fn test_preconditions_abort_before_any_edit() {
    let workspace = scenario().with_file("src/c/b.rs", "");

    assert_eq!(
        precondition(workspace.clone(), |p| MoveRequest {
            files: vec![],
            target: module(p, "crate::c"),
        }),
        PreconditionError::FileCount(0)
    );
    assert_eq!(
        precondition(workspace.clone(), |p| MoveRequest::new("src/lib.rs", module(p, "crate::c"))),
        PreconditionError::CrateRoot(PathBuf::from("src/lib.rs"))
    );
    assert_eq!(
        precondition(workspace.clone(), |p| MoveRequest::new("src/a/b.rs", module(p, "crate::c"))),
        PreconditionError::DestinationExists(PathBuf::from("src/c/b.rs"))
    );
    assert_eq!(
        precondition(workspace.clone(), |p| MoveRequest::new("src/a.rs", module(p, "crate::a::x"))),
        PreconditionError::MoveIntoSelf("crate::a::x".to_string())
    );
    assert_eq!(
        precondition(workspace.clone(), |p| MoveRequest::new("src/a.rs", module(p, "crate::c"))),
        PreconditionError::DirectorySubtree(PathBuf::from("src/a.rs"))
    );
    assert_eq!(
        precondition(workspace, |p| MoveRequest::new("src/other.rs", module(p, "crate::c"))),
        PreconditionError::UnknownFile(PathBuf::from("src/other.rs"))
    );
}

#[test]
fn test_name_collision_and_declaration_checks() {
    let collision = |c_rs: &str| {
        let workspace = scenario().with_file("src/c.rs", c_rs);
        precondition(workspace, |p| MoveRequest::new("src/a/b.rs", module(p, "crate::c")))
    };
    let expected = PreconditionError::NameCollision {
        target: "crate::c".to_string(),
        name: "b".to_string(),
    };
    assert_eq!(collision("mod b {}\n"), expected);
    assert_eq!(collision("pub struct b;\n"), expected);
    assert_eq!(collision("use crate::a::x as b;\n"), expected);

    let ambiguous = crate_with(&[
        ("src/lib.rs", "mod a;\n#[path = \"a.rs\"]\nmod alias;\nmod c;\n"),
        ("src/a.rs", ""),
        ("src/c.rs", ""),
    ]);
    assert_eq!(
        precondition(ambiguous, |p| MoveRequest::new("src/a.rs", module(p, "crate::c"))),
        PreconditionError::AmbiguousDeclaration {
            file: PathBuf::from("src/a.rs"),
            count: 2,
        }
    );

    let attributed = crate_with(&[
        ("src/lib.rs", "#[path = \"other.rs\"]\nmod a;\nmod c;\n"),
        ("src/other.rs", ""),
        ("src/c.rs", ""),
    ]);
    assert_eq!(
        precondition(attributed, |p| MoveRequest::new("src/other.rs", module(p, "crate::c"))),
        PreconditionError::PathAttribute(PathBuf::from("src/other.rs"))
    );
}

#[test]
fn test_crate_mismatch_and_unknown_target() {
    let workspace = scenario()
        .with_crate_root("src/main.rs")
        .with_file("src/main.rs", "fn main() {}\n");
    assert_eq!(
        precondition(workspace.clone(), |p| {
            let main = p.crate_roots().nth(1).unwrap();
            MoveRequest::new("src/a/b.rs", main)
        }),
        PreconditionError::CrateMismatch {
            file: PathBuf::from("src/a/b.rs"),
            target: "crate".to_string(),
        }
    );

    let engine = MoveEngine::new(MoveConfig::default()).unwrap();
    let program = engine.snapshot(workspace).unwrap();
    let error = engine
        .request(&program, Path::new("src/a/b.rs"), "crate::nope")
        .unwrap_err();
    assert!(matches!(
        error,
        Error::Precondition(PreconditionError::UnknownTarget(_))
    ));
}

#[test]
fn test_cancelled_detection_leaves_nothing_behind() -> Result<()> {
    let engine = MoveEngine::new(MoveConfig::default())?;
    let program = engine.snapshot(scenario())?;
    let request = engine.request(&program, Path::new("src/a/b.rs"), "crate::c")?;
    let token = CancelToken::new();
    token.cancel();

    let mut session = engine.session(&program, request);
    assert_eq!(session.advance(&AlwaysConfirm, &token)?, MoveState::DetectConflicts);
    assert!(matches!(
        session.advance(&AlwaysConfirm, &token),
        Err(Error::Cancelled)
    ));
    assert_eq!(session.state(), MoveState::Cancelled);
    assert!(session.plan().is_empty());
    assert!(session.report().is_empty());
    Ok(())
}
