use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use phpantom_typearg::Project;
use phpantom_typearg::diagnostics::CollectingSink;
use phpantom_typearg::engine::{CallSite, OverrideTable};

const LOCATORS: usize = 50;
const CALLS_PER_LOCATOR: usize = 20;

/// `LOCATORS` service locators, each with a constants class, and a usage
/// file calling every one of them with a mix of argument shapes.
fn project_source() -> Project {
    let mut project = Project::new();
    let mut usage = String::from("<?php\nnamespace Bench;\n\n");

    for i in 0..LOCATORS {
        project.add_file(
            &format!("locator{i}.php"),
            &format!(
                r#"<?php
namespace Bench;

class Services{i}
{{
    public const MAILER = '\Exception';
    public const COUNT = {i};
}}

class Locator{i}
{{
    /**
     * @return mixed
     * @returnTypeArg $type
     */
    public static function instance($type, array $args = []) {{}}

    public static function unrelated($type) {{}}
}}
"#
            ),
        );

        for j in 0..CALLS_PER_LOCATOR {
            let argument = match j % 4 {
                0 => "'\\Exception'".to_string(),
                1 => format!("Services{i}::MAILER"),
                2 => format!("Services{i}::COUNT"),
                _ => "$dynamic".to_string(),
            };
            usage.push_str(&format!("$x{i}_{j} = Locator{i}::instance({argument});\n"));
        }
        usage.push_str(&format!("Locator{i}::unrelated('\\Exception');\n"));
    }

    project.add_file("usage.php", &usage);
    project
}

fn bench_build(c: &mut Criterion) {
    let project = project_source();

    c.bench_function("override_table_build", |b| {
        b.iter(|| {
            let sink = CollectingSink::new();
            let table = OverrideTable::build(project.classes().flat_map(|c| c.methods.iter()), &sink);
            black_box(table.len())
        })
    });
}

fn bench_call_sites(c: &mut Criterion) {
    let project = project_source();
    let symbols = project.symbols();
    let sink = CollectingSink::new();
    let table = OverrideTable::build(project.classes().flat_map(|c| c.methods.iter()), &sink);
    let calls = &project
        .parsed("usage.php")
        .expect("usage file is loaded")
        .calls;

    let sites: Vec<_> = calls
        .iter()
        .filter_map(|call| {
            let method = symbols.find_method(&call.class, &call.method)?;
            Some((call, method))
        })
        .collect();
    assert_eq!(sites.len(), LOCATORS * (CALLS_PER_LOCATOR + 1));

    c.bench_function("call_site_evaluation", |b| {
        b.iter(|| {
            let sink = CollectingSink::new();
            let mut inferred = 0;
            for (call, method) in &sites {
                let site = CallSite {
                    method: &method.id,
                    arguments: &call.arguments,
                    context: &call.context,
                    declared_return_type: &method.return_type,
                    location: &call.location,
                };
                if table.override_return_type(&site, &symbols, &sink).is_some() {
                    inferred += 1;
                }
            }
            black_box((inferred, sink.len()))
        })
    });
}

fn bench_analyze(c: &mut Criterion) {
    let project = project_source();

    c.bench_function("project_analyze", |b| {
        b.iter(|| black_box(project.analyze().inferences.len()))
    });
}

criterion_group!(benches, bench_build, bench_call_sites, bench_analyze);
criterion_main!(benches);
