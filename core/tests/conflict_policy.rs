mod common;

use std::cell::Cell;

use cmdforge_core::{
    BuildCore, ConflictStrategy, CoreError, CreateOutcome, Level, PackConfig, Resource, ResourceKind, ResourcePath,
};
use common::{config, function_text};

fn define_twice(strategy: ConflictStrategy) -> (BuildCore, Result<(), CoreError>, bool) {
    let mut core = BuildCore::new(config());
    core.mcfunction_with("f", strategy, |c| c.command("say first")).unwrap();

    let ran = Cell::new(false);
    let second = core
        .mcfunction_with("f", strategy, |c| {
            ran.set(true);
            c.command("say second")
        })
        .map(|_| ());
    (core, second, ran.get())
}

fn body(mut core: BuildCore) -> String {
    let resources = core.generate_resources(Vec::new()).unwrap();
    function_text(&resources, "demo:f").unwrap()
}

#[test]
fn throw_rejects_the_duplicate() {
    let (_, second, ran) = define_twice(ConflictStrategy::Throw);
    assert!(matches!(second, Err(CoreError::DuplicateResource { path }) if path == "demo:f"));
    assert!(!ran);
}

#[test]
fn replace_discards_the_first_body() {
    let (core, second, ran) = define_twice(ConflictStrategy::Replace);
    assert!(second.is_ok() && ran);
    assert_eq!(body(core), "say second");
}

#[test]
fn ignore_keeps_the_first_body_silently() {
    let (core, second, ran) = define_twice(ConflictStrategy::Ignore);
    assert!(second.is_ok());
    assert!(!ran);
    assert!(core.diagnostics().is_empty());
    assert_eq!(body(core), "say first");
}

#[test]
fn warn_keeps_the_first_body_and_reports() {
    let (core, second, ran) = define_twice(ConflictStrategy::Warn);
    assert!(second.is_ok());
    assert!(!ran);

    let warnings: Vec<_> = core.diagnostics().warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, Level::Warning);
    assert_eq!(warnings[0].resource.as_deref(), Some("demo:f"));
    assert_eq!(body(core), "say first");
}

#[test]
fn append_concatenates_in_creation_order() {
    let (core, second, ran) = define_twice(ConflictStrategy::Append);
    assert!(second.is_ok() && ran);
    assert_eq!(body(core), "say first\nsay second");
}

#[test]
fn prepend_puts_the_new_body_first() {
    let (core, second, ran) = define_twice(ConflictStrategy::Prepend);
    assert!(second.is_ok() && ran);
    assert_eq!(body(core), "say second\nsay first");
}

#[test]
fn prepended_bodies_keep_their_chains() {
    let mut core = BuildCore::new(config());
    core.mcfunction("f", |c| c.command("say tail")).unwrap();
    core.mcfunction_with("f", ConflictStrategy::Prepend, |c| {
        c.if_("entity @s", |c| c.command("say inside"))?;
        Ok(())
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    let lines: Vec<String> = function_text(&resources, "demo:f").unwrap().lines().map(String::from).collect();
    assert_eq!(lines[0], "scoreboard players set $chain_0 __cmdforge 0");
    assert_eq!(lines.last().unwrap(), "say tail");
    assert_eq!(
        function_text(&resources, "demo:__cmdforge/f/chain_0_0").unwrap(),
        "scoreboard players set $chain_0 __cmdforge 1\nsay inside"
    );
}

#[test]
fn append_and_prepend_are_function_only() {
    let mut core = BuildCore::new(config());
    let path = ResourcePath::parse("demo", ResourceKind::Advancement, "story/root");
    let doc = serde_json::json!({ "criteria": {} });

    let first = core
        .create_resource(path.clone(), ResourceKind::Advancement, Resource::Json(doc.clone()), ConflictStrategy::Throw)
        .unwrap();
    assert_eq!(first, CreateOutcome::Created);

    for strategy in [ConflictStrategy::Append, ConflictStrategy::Prepend] {
        let err = core
            .create_resource(path.clone(), ResourceKind::Advancement, Resource::Json(doc.clone()), strategy)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidConflictStrategy { kind: ResourceKind::Advancement, .. }
        ));
    }

    let config = PackConfig::new("demo").with_strategy(ResourceKind::Predicate, ConflictStrategy::Append);
    assert!(matches!(config, Err(CoreError::InvalidConflictStrategy { .. })));
}

#[test]
fn configured_strategy_applies_per_kind() {
    let config = PackConfig::new("demo")
        .with_strategy(ResourceKind::Function, ConflictStrategy::Append)
        .unwrap()
        .with_strategy(ResourceKind::Tag, ConflictStrategy::Throw)
        .unwrap();
    let mut core = BuildCore::new(config);

    core.mcfunction("f", |c| c.command("say 1")).unwrap();
    core.mcfunction("f", |c| c.command("say 2")).unwrap();

    core.json_resource(ResourceKind::Tag, "functions/all", serde_json::json!({ "values": [] }))
        .unwrap();
    let err = core
        .json_resource(ResourceKind::Tag, "functions/all", serde_json::json!({ "values": [] }))
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateResource { .. }));

    assert_eq!(body(core), "say 1\nsay 2");
}

#[test]
fn replacing_json_swaps_the_document() {
    let mut core = BuildCore::new(config());
    let path = ResourcePath::parse("demo", ResourceKind::Predicate, "is_day");
    core.create_resource(path.clone(), ResourceKind::Predicate, Resource::Json(serde_json::json!(1)), ConflictStrategy::Throw)
        .unwrap();
    let outcome = core
        .create_resource(path.clone(), ResourceKind::Predicate, Resource::Json(serde_json::json!(2)), ConflictStrategy::Replace)
        .unwrap();
    assert_eq!(outcome, CreateOutcome::Replaced);

    let node = core.graph().iter().find(|n| n.path == path).unwrap();
    assert_eq!(node.resource, Resource::Json(serde_json::json!(2)));
}
