//! Cross-document behavior: the shared global environment, module-mode
//! registration and merge, and pass invalidation.

mod common;

use common::*;
use lua_ast::Node;
use lua_semantic_analyzer::analysis::symbol::ModuleRef;
use lua_semantic_analyzer::{Analyzer, GlobalEnvironment, LuaType, SymbolInfo, SymbolRef};
use std::sync::Arc;

fn module_type(symbol: &SymbolRef) -> ModuleRef {
    match &symbol.read().ty {
        LuaType::Module(module) => module.clone(),
        other => panic!("expected module symbol, got {}", other.type_name()),
    }
}

/// Builds:
///
/// ```lua
/// module("foo")
/// function bar() end
/// ```
fn module_mode_tree() -> Node {
    chunk(
        vec![
            call_stmt(call(ident("module", 0), vec![string("foo", 7)], 13)),
            function(Some(ident("bar", 23)), false, vec![], vec![], sp(14, 32)),
        ],
        32,
    )
}

fn outline_names(info: &SymbolInfo) -> Vec<(String, String)> {
    info.children.iter().map(|c| (c.name.clone(), c.type_name.to_string())).collect()
}

#[test]
fn global_assignment_is_visible_across_documents() {
    let env = GlobalEnvironment::new();

    // Document A:  answer = 42
    let a = chunk(vec![assign_stmt(vec![ident("answer", 0)], vec![number(42.0, 9, 2)], sp(0, 11))], 11);
    Analyzer::with_env(env.clone()).analyze(&a, "file:///a.lua");

    assert!(env.get("answer").is_some());
    assert_eq!(env.document_globals("file:///a.lua").len(), 1);

    // Document B resolves it through its module search (metatable to _G).
    let b = chunk(vec![], 0);
    let b_module = Analyzer::with_env(env.clone()).analyze(&b, "file:///b.lua");
    let found = module_type(&b_module).read().search("answer", 0);
    assert!(found.is_some());
}

#[test]
fn reanalysis_invalidates_previous_pass() {
    let env = GlobalEnvironment::new();
    let tree = chunk(vec![local_stmt(vec![ident("x", 6)], vec![number(1.0, 10, 1)], sp(0, 11))], 11);

    let first = Analyzer::with_env(env.clone()).analyze(&tree, "file:///doc.lua");
    assert!(first.read().is_valid());

    let second = Analyzer::with_env(env.clone()).analyze(&tree, "file:///doc.lua");
    assert!(!first.read().is_valid(), "old pass must be stale");
    assert!(second.read().is_valid());

    // Every symbol of the old pass shares the stale flag.
    let old_x = find_symbol(&first, "x").expect("x missing");
    assert!(!old_x.read().is_valid());
}

#[test]
fn module_merge_is_idempotent() {
    let env = GlobalEnvironment::new();
    let tree = module_mode_tree();

    let first = Analyzer::with_env(env.clone()).analyze(&tree, "file:///foo.lua");
    let first_outline = first.read().snapshot();

    let second = Analyzer::with_env(env.clone()).analyze(&tree, "file:///foo.lua");
    let second_outline = second.read().snapshot();

    // Same shape both times.
    assert_eq!(outline_names(&first_outline), outline_names(&second_outline));
    assert_eq!(first_outline.name, second_outline.name);

    // _G still holds the first registration, with the stale field replaced by
    // the fresh pass's symbol.
    let registered = env.get("foo").expect("foo missing from _G");
    assert!(Arc::ptr_eq(&registered, &first));
    let table = registered.read().ty.table_handle().expect("module table missing");
    let bar = table.read().get("bar").expect("bar missing");
    assert!(bar.read().is_valid(), "merged field must come from the live pass");
}

#[test]
fn module_merge_keeps_vanished_fields() {
    let env = GlobalEnvironment::new();

    let full = module_mode_tree();
    Analyzer::with_env(env.clone()).analyze(&full, "file:///foo.lua");

    // Re-analysis without `bar`: the stale field is kept, not removed.
    let emptied = chunk(vec![call_stmt(call(ident("module", 0), vec![string("foo", 7)], 13))], 13);
    Analyzer::with_env(env.clone()).analyze(&emptied, "file:///foo.lua");

    let registered = env.get("foo").expect("foo missing from _G");
    let table = registered.read().ty.table_handle().expect("module table missing");
    let bar = table.read().get("bar").expect("vanished field should leak");
    assert!(!bar.read().is_valid(), "leaked field is stale");
}

#[test]
fn invalidate_document_drops_globals_map() {
    let env = GlobalEnvironment::new();
    let tree = chunk(vec![assign_stmt(vec![ident("g", 0)], vec![boolean(true, 4)], sp(0, 8))], 8);
    let module = Analyzer::with_env(env.clone()).analyze(&tree, "file:///gone.lua");

    assert_eq!(env.document_globals("file:///gone.lua").len(), 1);
    env.invalidate_document("file:///gone.lua");
    assert!(env.document_globals("file:///gone.lua").is_empty());
    assert!(!module.read().is_valid());

    // The `_G` entry itself is left behind for the merge rule to replace.
    let leaked = env.get("g").expect("g should remain in _G");
    assert!(!leaked.read().is_valid());
}

#[test]
fn module_name_falls_back_to_uri_tail() {
    let env = GlobalEnvironment::new();
    let tree = chunk(vec![], 0);

    let module = Analyzer::with_env(env.clone()).analyze(&tree, "file:///pkg/socket-core.lua");
    assert_eq!(module.read().name, "socket-core");

    let module = Analyzer::with_env(env).analyze(&tree, "untitled:Untitled-1");
    assert_eq!(module.read().name, "Untitled-1");
}

#[test]
fn document_globals_recorded_in_module_env() {
    let env = GlobalEnvironment::new();
    // g = true
    let tree = chunk(vec![assign_stmt(vec![ident("g", 0)], vec![boolean(true, 4)], sp(0, 8))], 8);
    let module = Analyzer::with_env(env.clone()).analyze(&tree, "file:///doc.lua");

    let mt = module_type(&module);
    let m = mt.read();
    assert!(m.menv.globals.contains_key("g"));
    let in_env = env.get("g").expect("g missing from _G");
    let in_module = m.menv.globals.get("g").expect("g missing from menv");
    assert!(Arc::ptr_eq(&in_env, in_module));
}
