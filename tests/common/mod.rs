#![allow(dead_code)]

use std::fs;

use phpantom_typearg::{Backend, Project, Report};

/// A service locator whose `instance()` return type follows its first
/// argument.  `Services::MAILER` names a string, `Services::COUNT` an int.
pub const LOCATOR: &str = r#"<?php

namespace App;

class Mailer {}

class Services
{
    public const MAILER = '\App\Mailer';
    public const COUNT = 3;
}

class Locator
{
    /**
     * @param string $type
     * @param array $args
     * @return mixed
     * @returnTypeArg $type
     */
    public static function instance($type, array $args = [])
    {
        return new $type(...$args);
    }
}
"#;

pub fn create_test_backend() -> Backend {
    Backend::new_test()
}

/// Build a project from `(file, content)` pairs.
pub fn project_with(files: &[(&str, &str)]) -> Project {
    let mut project = Project::new();
    for (name, content) in files {
        project.add_file(name, content);
    }
    project
}

/// Analyse `LOCATOR` plus one extra file holding the calls under test.
pub fn analyze_calls(calls: &str) -> Report {
    project_with(&[("locator.php", LOCATOR), ("calls.php", calls)]).analyze()
}

/// The inferred return types in `report`, in order, as strings.
pub fn return_types(report: &Report) -> Vec<String> {
    report
        .inferences
        .iter()
        .map(|i| i.return_type.to_string())
        .collect()
}

/// Helper: create a temp workspace holding `files`, relative to its root.
pub fn create_workspace(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    for (rel_path, content) in files {
        let full = dir.path().join(rel_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("failed to create dirs");
        }
        fs::write(&full, content).expect("failed to write file");
    }
    dir
}
