//! Closed set of supported (product, operation) use cases.
//!
//! The menu presents exactly these pairs; the engine is prompted with the
//! selected pair and nothing else. Keep entries aligned with what the
//! reasoning engine is expected to handle.

/// One selectable use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseCase {
    pub product: &'static str,
    pub operation: &'static str,
}

impl UseCase {
    /// Human-readable menu label, e.g. "Install curl".
    pub fn label(&self) -> String {
        format!("{} {}", self.operation, self.product)
    }
}

/// All use cases, in menu order.
pub fn use_cases() -> Vec<UseCase> {
    vec![
        UseCase {
            product: "Splunk-OTel-Collector",
            operation: "Install",
        },
        UseCase {
            product: "Splunk-OTel-Collector",
            operation: "Uninstall",
        },
        UseCase {
            product: "curl",
            operation: "Install",
        },
    ]
}
