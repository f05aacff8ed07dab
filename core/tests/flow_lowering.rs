mod common;

use cmdforge_core::{BuildCore, Condition, CoreError, Score};
use common::{config, function_lines, function_names, function_text, Machine};

#[test]
fn if_else_if_else_lowers_into_guarded_calls() {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        c.command("say before")?;
        c.if_("entity @s[tag=a]", |c| c.command("say 1"))?
            .else_if("entity @s[tag=b]", |c| c.command("say 2"))?
            .else_(|c| c.command("say 3"))?;
        c.command("say after")
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    let main = function_lines(&resources, "demo:main");
    assert_eq!(
        main,
        vec![
            "say before",
            "scoreboard players set $chain_0 __cmdforge 0",
            "execute if entity @s[tag=a] if score $chain_0 __cmdforge matches 0 run function demo:__cmdforge/main/chain_0_0",
            "execute if entity @s[tag=b] if score $chain_0 __cmdforge matches 0 run function demo:__cmdforge/main/chain_0_1",
            "execute if score $chain_0 __cmdforge matches 0 run function demo:__cmdforge/main/chain_0_2",
            "say after",
        ]
    );

    let mark = "scoreboard players set $chain_0 __cmdforge 1";
    assert_eq!(function_lines(&resources, "demo:__cmdforge/main/chain_0_0"), vec![mark, "say 1"]);
    assert_eq!(function_lines(&resources, "demo:__cmdforge/main/chain_0_1"), vec![mark, "say 2"]);
    // the else body holds the mark and its command, no condition check
    assert_eq!(function_lines(&resources, "demo:__cmdforge/main/chain_0_2"), vec![mark, "say 3"]);
}

#[test]
fn attaching_to_a_sealed_chain_fails() {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        let chain = c.if_("entity @s", |c| c.command("say 1"))?.chain();
        c.attach_else(chain, |c| c.command("say 2"))?;

        let err = c.attach_else_if(chain, "entity @p", |c| c.command("say 3")).unwrap_err();
        assert!(matches!(err, CoreError::ChainAlreadySealed { chain: 0 }));
        let err = c.attach_else(chain, |c| c.command("say 4")).unwrap_err();
        assert!(matches!(err, CoreError::ChainAlreadySealed { .. }));
        Ok(())
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    assert_eq!(function_lines(&resources, "demo:__cmdforge/main/chain_0_1").last().unwrap(), "say 2");
    assert!(function_text(&resources, "demo:__cmdforge/main/chain_0_2").is_none());
}

#[test]
fn chains_are_sealed_once_followed_by_another_command() {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        let chain = c.if_("entity @s[tag=a]", |c| c.command("say a"))?.chain();
        c.command("say between")?;

        let err = c.attach_else_if(chain, "entity @s[tag=b]", |c| c.command("say b")).unwrap_err();
        assert!(matches!(err, CoreError::ChainAlreadySealed { chain: 0 }));
        Ok(())
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    let main = function_lines(&resources, "demo:main");
    assert_eq!(main.len(), 3);
    assert_eq!(main[2], "say between");
    assert!(function_text(&resources, "demo:__cmdforge/main/chain_0_1").is_none());
}

#[test]
fn a_following_chain_seals_the_previous_one() {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        let first = c.if_("entity @s[tag=a]", |c| c.command("say a"))?.chain();
        let second = c.if_("entity @s[tag=b]", |c| c.command("say b"))?.chain();

        assert!(matches!(c.attach_else(first, |c| c.command("say late")), Err(CoreError::ChainAlreadySealed { .. })));
        c.attach_else(second, |c| c.command("say other"))
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    assert!(function_text(&resources, "demo:__cmdforge/main/chain_0_1").is_none());
    assert_eq!(function_lines(&resources, "demo:__cmdforge/main/chain_1_1").last().unwrap(), "say other");
}

#[test]
fn chains_are_sealed_once_their_function_is_left() {
    let mut core = BuildCore::new(config());
    let mut chain = None;
    core.mcfunction("main", |c| {
        chain = Some(c.if_("entity @s", |c| c.command("say 1"))?.chain());
        Ok(())
    })
    .unwrap();

    core.mcfunction("other", |c| {
        let err = c.attach_else(chain.unwrap(), |c| c.command("say late")).unwrap_err();
        assert!(matches!(err, CoreError::ChainAlreadySealed { .. }));
        Ok(())
    })
    .unwrap();
}

#[test]
fn nested_chains_get_their_own_register() {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        c.if_("entity @s[tag=outer]", |c| {
            c.command("say outer")?;
            c.if_("entity @s[tag=inner]", |c| c.command("say inner"))?
                .else_(|c| c.command("say not inner"))
        })?;
        Ok(())
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    let outer = function_lines(&resources, "demo:__cmdforge/main/chain_0_0");
    assert_eq!(outer[0], "scoreboard players set $chain_0 __cmdforge 1");
    assert_eq!(outer[1], "say outer");
    assert_eq!(outer[2], "scoreboard players set $chain_1 __cmdforge 0");
    // the body calls functions, so the outer mark is restored after it
    assert_eq!(outer.last().unwrap(), "scoreboard players set $chain_0 __cmdforge 1");
    assert!(outer.iter().any(|l| l.ends_with("run function demo:__cmdforge/main/chain_1_0")));
    assert!(outer.iter().any(|l| l.ends_with("run function demo:__cmdforge/main/chain_1_1")));

    assert_eq!(
        function_lines(&resources, "demo:__cmdforge/main/chain_1_0"),
        vec!["scoreboard players set $chain_1 __cmdforge 1", "say inner"]
    );
    assert_eq!(
        function_lines(&resources, "demo:__cmdforge/main/chain_1_1"),
        vec!["scoreboard players set $chain_1 __cmdforge 1", "say not inner"]
    );

    // nested content never leaks into the enclosing function
    let main = function_text(&resources, "demo:main").unwrap();
    assert!(!main.contains("say"));
    assert!(!main.contains("$chain_1"));
}

#[test]
fn empty_branches_keep_their_guard_but_get_no_function() {
    let mut core = BuildCore::new(config());
    let ready = Score::new("$ready", "test");
    core.mcfunction("main", |c| {
        c.if_(ready.matches(1), |_| Ok(()))?.else_(|c| c.command("say fallback"))
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    let main = function_lines(&resources, "demo:main");
    assert_eq!(main.len(), 3);
    assert_eq!(
        main[1],
        "execute if score $ready test matches 1 if score $chain_0 __cmdforge matches 0 run scoreboard players set $chain_0 __cmdforge 1"
    );
    assert!(main[2].ends_with("run function demo:__cmdforge/main/chain_0_1"));
    assert!(!function_names(&resources).contains(&"demo:__cmdforge/main/chain_0_0".to_string()));

    // the empty branch still excludes the else when its condition holds
    let mut machine = Machine::new(&resources);
    machine.set_score("$ready", "test", 1);
    machine.run("demo:main");
    assert!(machine.said.is_empty());

    let mut machine = Machine::new(&resources);
    machine.set_score("$ready", "test", 0);
    machine.run("demo:main");
    assert_eq!(machine.said, vec!["fallback".to_string()]);
}

#[test]
fn lowered_conditions_render_negations() {
    let mut core = BuildCore::new(config());
    let flag = core.score("flag", "state");
    core.mcfunction("main", |c| {
        c.if_(flag.truthy().and(Condition::test("entity @s").not()), |c| c.command("say on"))?;
        Ok(())
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    let main = function_lines(&resources, "demo:main");
    assert_eq!(
        main[1],
        "execute unless score flag state matches 0 unless entity @s if score $chain_0 __cmdforge matches 0 run function demo:__cmdforge/main/chain_0_0"
    );
}

#[test]
fn negated_conjunction_cannot_be_lowered() {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        let both = Condition::test("entity @s").and(Condition::test("entity @p"));
        c.if_(both.not(), |c| c.command("say nope"))?;
        Ok(())
    })
    .unwrap();

    let err = core.generate_resources(Vec::new()).unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedCondition(_)));
    assert!(!core.graph().is_finalized());
}

#[test]
fn unlowered_function_cannot_be_flattened() {
    let mut core = BuildCore::new(config());
    let main = core
        .mcfunction("main", |c| {
            c.if_("entity @s", |c| c.command("say 1"))?;
            Ok(())
        })
        .unwrap();

    let err = core.graph().function(&main).unwrap().flatten(&main).unwrap_err();
    assert!(matches!(err, CoreError::PostProcessingRequired(_)));
}

#[test]
fn flow_objective_is_created_on_load() {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        c.if_("entity @s", |c| c.command("say 1"))?;
        Ok(())
    })
    .unwrap();

    let resources = core.generate_resources(Vec::new()).unwrap();
    assert_eq!(
        function_text(&resources, "demo:__cmdforge/load").unwrap(),
        "scoreboard objectives add __cmdforge dummy"
    );
    let tag = resources
        .iter()
        .find(|r| r.relative_path() == "data/minecraft/tags/functions/load.json")
        .expect("load tag");
    assert_eq!(
        tag.content,
        cmdforge_core::ResourceContent::Json(serde_json::json!({ "values": ["demo:__cmdforge/load"] }))
    );
}

fn build_chain(branches: usize, with_else: bool) -> Vec<cmdforge_core::EmittedResource> {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        let cond = |i: usize| Score::new(format!("$c{}", i), "test").matches(1);
        let mut statement = c.if_(cond(0), |c| c.command("say 0"))?;
        let conditional = if with_else { branches - 1 } else { branches };
        for i in 1..conditional {
            statement = statement.else_if(cond(i), move |c| c.command(format!("say {}", i)))?;
        }
        if with_else {
            let last = branches - 1;
            statement.else_(move |c| c.command(format!("say {}", last)))?;
        }
        Ok(())
    })
    .unwrap();
    core.generate_resources(Vec::new()).unwrap()
}

#[test]
fn exactly_the_first_matching_branch_runs() {
    for branches in 2..=5 {
        for with_else in [false, true] {
            let resources = build_chain(branches, with_else);
            let conditional = if with_else { branches - 1 } else { branches };

            // every truth assignment, overlapping ones included
            for mask in 0u32..(1 << conditional) {
                let mut machine = Machine::new(&resources);
                for i in 0..conditional {
                    let value = if mask & (1 << i) != 0 { 1 } else { 0 };
                    machine.set_score(&format!("$c{}", i), "test", value);
                }
                machine.run("demo:main");

                let first = (0..conditional).find(|i| mask & (1 << i) != 0);
                let expected = match (first, with_else) {
                    (Some(i), _) => vec![i.to_string()],
                    (None, true) => vec![(branches - 1).to_string()],
                    (None, false) => Vec::new(),
                };
                assert_eq!(machine.said, expected, "branches={} else={} mask={:b}", branches, with_else, mask);

                let synthetic_calls = machine.calls.iter().filter(|c| c.contains("chain_")).count();
                assert_eq!(synthetic_calls, expected.len());
            }
        }
    }
}

/// `main` holds `if ($c0) { body } else if ($c1) { say second }`, where the
/// first body calls `main` again after its own commands.
fn build_recursive_chain(first_body: &'static [&'static str]) -> Vec<cmdforge_core::EmittedResource> {
    let mut core = BuildCore::new(config());
    core.mcfunction("main", |c| {
        c.if_(Score::new("$c0", "test").matches(1), |c| {
            for line in first_body {
                c.command(*line)?;
            }
            Ok(())
        })?
        .else_if(Score::new("$c1", "test").matches(1), |c| c.command("say second"))?;
        Ok(())
    })
    .unwrap();
    core.generate_resources(Vec::new()).unwrap()
}

#[test]
fn recursive_branches_never_run_their_siblings() {
    // the inner run matches the second branch
    let resources = build_recursive_chain(&[
        "scoreboard players set $c0 test 0",
        "scoreboard players set $c1 test 1",
        "say first",
        "function demo:main",
    ]);
    let mut machine = Machine::new(&resources);
    machine.set_score("$c0", "test", 1);
    machine.set_score("$c1", "test", 0);
    machine.run("demo:main");
    assert_eq!(machine.said, vec!["first".to_string(), "second".to_string()]);
    let second_calls = machine.calls.iter().filter(|c| c.ends_with("chain_0_1")).count();
    assert_eq!(second_calls, 1);

    // the inner run matches nothing, then the second condition becomes true
    let resources = build_recursive_chain(&[
        "scoreboard players set $c0 test 0",
        "say first",
        "function demo:main",
        "scoreboard players set $c1 test 1",
    ]);
    let mut machine = Machine::new(&resources);
    machine.set_score("$c0", "test", 1);
    machine.set_score("$c1", "test", 0);
    machine.run("demo:main");
    assert_eq!(machine.said, vec!["first".to_string()]);
}

#[test]
fn truthy_scores_include_unset_ones() {
    let mut core = BuildCore::new(config());
    let flag = core.score("$flag", "state");
    core.mcfunction("main", |c| {
        c.if_(flag.truthy(), |c| c.command("say on"))?.else_(|c| c.command("say off"))
    })
    .unwrap();
    let resources = core.generate_resources(Vec::new()).unwrap();

    for (value, expected) in [(None, "on"), (Some(0), "off"), (Some(3), "on")] {
        let mut machine = Machine::new(&resources);
        if let Some(value) = value {
            machine.set_score("$flag", "state", value);
        }
        machine.run("demo:main");
        assert_eq!(machine.said, vec![expected.to_string()]);
    }
}
