/// Built-in PHP classes.
///
/// Call sites routinely name core classes (`'\Exception'`,
/// `\DateTime::ATOM`, constants holding `'\SplQueue'`, ...), so the
/// symbol table must know them without any PHP source in the workspace.
///
/// The declarations live in `stubs/core.php`, embedded at compile time
/// and parsed once with the same extractor as workspace files.  They
/// cover the core, SPL, date, JSON and reflection extensions that ship
/// with every PHP build, with their hierarchy and constants.
use std::sync::OnceLock;

use crate::parser::parse_php;
use crate::types::ClassInfo;

/// The file key built-in classes are registered under.
pub const STUB_FILE: &str = "phpantom-stub://core.php";

static CORE_STUBS: &str = include_str!("../stubs/core.php");

/// Every built-in class, interface and enum.
pub fn builtin_classes() -> &'static [ClassInfo] {
    static CLASSES: OnceLock<Vec<ClassInfo>> = OnceLock::new();
    CLASSES.get_or_init(|| {
        let parsed = parse_php(STUB_FILE, CORE_STUBS);
        tracing::debug!(classes = parsed.classes.len(), "loaded built-in stubs");
        parsed.classes
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConstantValue;

    fn builtin(key: &str) -> Option<&'static ClassInfo> {
        builtin_classes()
            .iter()
            .find(|c| c.fqn.lookup_key() == key)
    }

    #[test]
    fn stubs_parse_without_calls_or_markers() {
        let parsed = parse_php(STUB_FILE, CORE_STUBS);
        assert!(parsed.calls.is_empty());
        assert!(builtin_classes().iter().all(|c| c.methods.is_empty()));
        assert!(builtin("exception").is_some());
        assert!(builtin("splqueue").is_some());
        assert!(builtin("app\\exception").is_none());
    }

    #[test]
    fn hierarchy_and_constants_are_kept() {
        let date_time = builtin("datetime").unwrap();
        assert_eq!(date_time.interfaces[0].as_str(), "\\DateTimeInterface");

        let interface = builtin("datetimeinterface").unwrap();
        assert_eq!(
            interface.constant("ATOM").unwrap().value,
            ConstantValue::String("Y-m-d\\TH:i:sP".into())
        );

        let runtime = builtin("runtimeexception").unwrap();
        assert_eq!(runtime.parent_class.as_ref().unwrap().as_str(), "\\Exception");
        assert_eq!(
            builtin("arrayobject").unwrap().constant("ARRAY_AS_PROPS").unwrap().value,
            ConstantValue::Integer("2".into())
        );
    }
}
