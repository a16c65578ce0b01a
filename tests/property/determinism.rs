//! Property-based tests for the deterministic fallbacks

use axiom::generation::analyst::fallback_scenario;
use axiom::generation::composer::{concatenate_units, test_function_names};
use axiom::generation::extractor::parse_headings;
use axiom::types::{Requirement, TestUnit};
use proptest::prelude::*;

fn heading_strategy() -> impl Strategy<Value = Vec<(String, String, String)>> {
    prop::collection::vec(
        (
            "[A-Za-z0-9_]{1,6}",
            "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]",
            "[a-z .]{0,40}",
        ),
        0..8,
    )
}

/// Heading parsing yields one requirement per heading, in order, every time
#[test]
fn test_heading_parser_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&heading_strategy(), |sections| {
            let mut document = String::from("# Feature\n\nIntro text.\n\n");
            for (code, title, body) in &sections {
                document.push_str(&format!("### AC-{}: {}\n{}\n\n", code, title, body));
            }

            let first = parse_headings(&document);
            let second = parse_headings(&document);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), sections.len());

            for (requirement, (code, title, body)) in first.iter().zip(&sections) {
                prop_assert_eq!(&requirement.id, &format!("AC-{}", code));
                prop_assert_eq!(&requirement.title, title);
                prop_assert_eq!(&requirement.description, body.trim());
            }

            Ok(())
        })
        .unwrap();
}

/// Concatenated modules define the host once and keep every function in order
#[test]
fn test_concatenation_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec("[a-z]{1,8}", 0..10), "[a-z]{1,10}"),
            |(stems, host)| {
                let units: Vec<TestUnit> = stems
                    .iter()
                    .enumerate()
                    .map(|(i, stem)| {
                        let name = format!("test_{}_{}", stem, i);
                        TestUnit {
                            requirement_id: format!("AC-{}", i),
                            scenario_id: format!("SCN-{}", i),
                            code: format!("def {}():\n    assert True", name),
                            function_name: name,
                            description: String::new(),
                        }
                    })
                    .collect();
                let target = format!("http://{}:8000", host);

                let module = concatenate_units(&units, &target, "AXIOM_TARGET_HOST");
                prop_assert_eq!(module.clone(), concatenate_units(&units, &target, "AXIOM_TARGET_HOST"));

                let host_lines = module
                    .lines()
                    .filter(|line| line.starts_with("BASE_URL"))
                    .count();
                prop_assert_eq!(host_lines, 1);

                let expected: Vec<String> =
                    units.iter().map(|u| u.function_name.clone()).collect();
                prop_assert_eq!(test_function_names(&module), expected);

                Ok(())
            },
        )
        .unwrap();
}

/// Fallback scenarios depend only on the requirement id and title
#[test]
fn test_fallback_scenario_ignores_description() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("AC-[0-9]{1,3}", "[A-Za-z ]{1,20}", any::<String>(), any::<String>()),
            |(id, title, first, second)| {
                let a = fallback_scenario(&Requirement {
                    id: id.clone(),
                    title: title.clone(),
                    description: first,
                });
                let b = fallback_scenario(&Requirement {
                    id: id.clone(),
                    title,
                    description: second,
                });
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(&a.requirement_id, &id);
                prop_assert!(a.scenario_id.ends_with(&id));

                Ok(())
            },
        )
        .unwrap();
}
