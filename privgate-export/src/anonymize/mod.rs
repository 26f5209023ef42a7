//! The per-column anonymization function library.
//!
//! Each builder turns one column's policy options into a boxed pure
//! `&str -> String` closure. Builders validate their options exactly once;
//! a malformed parameter yields a constant function returning an in-band
//! error string, so one bad column never aborts an export. The compiled
//! table is immutable and shared across all de-identifier workers.

use std::sync::Arc;

use privgate_core::policy::{AnonymizeMethod, PolicyMap};

mod encrypt;
mod mask;
mod range;
mod round;

pub use encrypt::build_encrypting_fn;
pub use mask::build_masking_fn;
pub use range::build_ranging_fn;
pub use round::build_rounding_fn;

/// A compiled single-column anonymization function.
pub type FieldFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Identity function for columns without a policy or with method `non`.
pub fn pass_as_is() -> FieldFn {
    Arc::new(|input: &str| input.to_string())
}

/// Drop-to-empty function for columns with an unrecognized method.
pub fn drop_all() -> FieldFn {
    Arc::new(|_: &str| String::new())
}

/// Constant function returning a fixed in-band error string.
pub(crate) fn constant(message: &'static str) -> FieldFn {
    Arc::new(move |_: &str| message.to_string())
}

/// Compiles the per-column function table for one export request.
///
/// The table is positional: entry *i* is applied to column *i* of every
/// canonical row. Columns absent from the policy map pass through
/// unchanged; unknown methods drop the column to the empty string.
pub fn compile_function_table(columns: &[String], policy: &PolicyMap) -> Vec<FieldFn> {
    let mut table = Vec::with_capacity(columns.len());
    for name in columns {
        let func = match policy.get(name) {
            Some(entry) => match entry.method {
                AnonymizeMethod::Encryption => build_encrypting_fn(&entry.options),
                AnonymizeMethod::Rounding => build_rounding_fn(&entry.options),
                AnonymizeMethod::DataRange => build_ranging_fn(&entry.options),
                AnonymizeMethod::BlankImpute | AnonymizeMethod::PiiReduction => {
                    build_masking_fn(&entry.options)
                }
                AnonymizeMethod::Non => pass_as_is(),
                AnonymizeMethod::Unknown => drop_all(),
            },
            None => pass_as_is(),
        };
        table.push(func);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use privgate_core::policy::{AnonymizeOptions, ColumnPolicy};

    fn policy_entry(method: AnonymizeMethod) -> ColumnPolicy {
        ColumnPolicy {
            method,
            options: AnonymizeOptions::default(),
            level: 0,
        }
    }

    #[test]
    fn test_table_is_positional_and_complete() {
        let columns = vec!["id".to_string(), "ssn".to_string(), "note".to_string()];
        let mut policy = PolicyMap::new();
        policy.insert("ssn".to_string(), policy_entry(AnonymizeMethod::Unknown));
        policy.insert("note".to_string(), policy_entry(AnonymizeMethod::Non));

        let table = compile_function_table(&columns, &policy);
        assert_eq!(table.len(), 3);

        // No policy entry: pass-through identity
        assert_eq!(table[0]("42"), "42");
        // Unknown method: drop to empty
        assert_eq!(table[1]("123-45-6789"), "");
        // Explicit non: byte-for-byte pass-through
        assert_eq!(table[2]("a,b \u{1F512}"), "a,b \u{1F512}");
    }

    #[test]
    fn test_masking_methods_share_the_masker() {
        let mut options = AnonymizeOptions::default();
        options.fore = "1".to_string();
        options.aft = "1".to_string();
        options.mask_char = "*".to_string();
        options.keep_length = "false".to_string();

        for method in [AnonymizeMethod::BlankImpute, AnonymizeMethod::PiiReduction] {
            let mut policy = PolicyMap::new();
            policy.insert(
                "name".to_string(),
                ColumnPolicy {
                    method,
                    options: options.clone(),
                    level: 0,
                },
            );
            let table = compile_function_table(&["name".to_string()], &policy);
            assert_eq!(table[0]("Alice"), "A*e");
        }
    }
}
