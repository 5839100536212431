//! Runs every `tests/fixtures/*.phpt` file through the analysis and
//! compares the text report with the `--EXPECT--` section.
//!
//! ```text
//! --TEST--
//! One line description
//! --FILE: src/Locator.php--
//! <?php ...
//! --FILE: src/usage.php--
//! <?php ...
//! --EXPECT--
//! src/usage.php:5 \App\Locator::instance() returns \Exception
//! ```
//!
//! A bare `--FILE--` section is registered as `test.php`.

use datatest_stable::Utf8Path;
use phpantom_typearg::Project;
use phpantom_typearg::report::render_text;

#[derive(Debug, Default)]
struct Fixture {
    description: String,
    files: Vec<(String, String)>,
    expect: String,
}

enum Section {
    None,
    Test,
    File,
    Expect,
}

fn section_header(line: &str) -> Option<&str> {
    let inner = line.trim_end().strip_prefix("--")?.strip_suffix("--")?;
    let is_header = inner == "TEST"
        || inner == "EXPECT"
        || inner == "FILE"
        || inner.starts_with("FILE:");
    is_header.then_some(inner)
}

fn parse_fixture(text: &str) -> Result<Fixture, String> {
    let mut fixture = Fixture::default();
    let mut section = Section::None;

    for line in text.lines() {
        if let Some(header) = section_header(line) {
            section = match header {
                "TEST" => Section::Test,
                "EXPECT" => Section::Expect,
                "FILE" => {
                    fixture.files.push(("test.php".to_string(), String::new()));
                    Section::File
                }
                file => {
                    let name = file.trim_start_matches("FILE:").trim();
                    fixture.files.push((name.to_string(), String::new()));
                    Section::File
                }
            };
            continue;
        }

        let target = match section {
            Section::None => return Err(format!("content before the first section: {line:?}")),
            Section::Test => &mut fixture.description,
            Section::Expect => &mut fixture.expect,
            Section::File => match fixture.files.last_mut() {
                Some((_, content)) => content,
                None => return Err("file section without a file".to_string()),
            },
        };
        target.push_str(line);
        target.push('\n');
    }

    if fixture.files.is_empty() {
        return Err("no --FILE-- section".to_string());
    }
    Ok(fixture)
}

fn check_fixture(path: &Utf8Path, contents: String) -> datatest_stable::Result<()> {
    let fixture = parse_fixture(&contents).map_err(|e| format!("{path}: {e}"))?;

    let mut project = Project::new();
    for (name, content) in &fixture.files {
        project.add_file(name, content);
    }
    let actual = render_text(&project.analyze());

    if actual.trim_end() != fixture.expect.trim_end() {
        return Err(format!(
            "{path}: {}\n--- expected ---\n{}\n--- actual ---\n{}",
            fixture.description.trim(),
            fixture.expect.trim_end(),
            actual.trim_end()
        )
        .into());
    }
    Ok(())
}

datatest_stable::harness! {
    { test = check_fixture, root = "tests/fixtures", pattern = r"\.phpt$" },
}
