//! Platform abstraction for the services the signing command consumes.
//!
//! - PIN / unlock gate
//! - Review screen returning the user's decision
//! - Short status notification
//!
//! # Design
//!
//! The command core never talks to a display or to the PIN manager itself.
//! The device build provides a real implementation; host builds and tests
//! use [`MockPlatform`].

use std::cell::{Cell, RefCell};

/// Platform abstraction trait.
pub trait Platform {
    /// True once the user unlocked the device.
    fn is_pin_validated(&self) -> bool;

    /// Displays review fields and returns true if the user approved.
    ///
    /// A display failure counts as a rejection.
    fn review(&self, title: &str, fields: &[(&str, &str)], action: &str) -> bool;

    /// Show a brief info message (success/failure).
    fn show_info(&self, success: bool, message: &str);
}

/// A review screen the mock was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownReview {
    pub title: String,
    pub fields: Vec<(String, String)>,
    pub action: String,
}

/// Mock platform for host-side testing.
pub struct MockPlatform {
    pin_validated: Cell<bool>,
    auto_approve: Cell<bool>,
    reviews: RefCell<Vec<ShownReview>>,
    infos: RefCell<Vec<(bool, String)>>,
}

impl MockPlatform {
    /// Create a new mock platform: unlocked, approving every review.
    pub fn new() -> Self {
        Self {
            pin_validated: Cell::new(true),
            auto_approve: Cell::new(true),
            reviews: RefCell::new(Vec::new()),
            infos: RefCell::new(Vec::new()),
        }
    }

    /// Set whether the PIN gate reports the device as unlocked.
    pub fn set_pin_validated(&self, validated: bool) {
        self.pin_validated.set(validated);
    }

    /// Set whether confirmations are auto-approved.
    pub fn set_auto_approve(&self, approve: bool) {
        self.auto_approve.set(approve);
    }

    /// Review screens shown so far.
    pub fn reviews(&self) -> Vec<ShownReview> {
        self.reviews.borrow().clone()
    }

    /// Notifications shown so far.
    pub fn infos(&self) -> Vec<(bool, String)> {
        self.infos.borrow().clone()
    }
}

impl Platform for MockPlatform {
    fn is_pin_validated(&self) -> bool {
        self.pin_validated.get()
    }

    fn review(&self, title: &str, fields: &[(&str, &str)], action: &str) -> bool {
        log::debug!("[MOCK] Review: {}", title);
        self.reviews.borrow_mut().push(ShownReview {
            title: title.to_string(),
            fields: fields
                .iter()
                .map(|(tag, value)| (tag.to_string(), value.to_string()))
                .collect(),
            action: action.to_string(),
        });
        self.auto_approve.get()
    }

    fn show_info(&self, success: bool, message: &str) {
        let icon = if success { "[OK]" } else { "[FAIL]" };
        log::debug!("[MOCK] {} {}", icon, message);
        self.infos.borrow_mut().push((success, message.to_string()));
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_platform_gates() {
        let platform = MockPlatform::new();
        assert!(platform.is_pin_validated());
        platform.set_pin_validated(false);
        assert!(!platform.is_pin_validated());
    }

    #[test]
    fn test_mock_platform_records_reviews() {
        let platform = MockPlatform::new();
        assert!(platform.review("Title", &[("Tag", "Value")], "Go"));

        platform.set_auto_approve(false);
        assert!(!platform.review("Again", &[], "Go"));

        let reviews = platform.reviews();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].title, "Title");
        assert_eq!(reviews[0].fields, vec![("Tag".to_string(), "Value".to_string())]);
        assert_eq!(reviews[1].action, "Go");
    }

    #[test]
    fn test_mock_platform_records_infos() {
        let platform = MockPlatform::new();
        platform.show_info(true, "done");
        platform.show_info(false, "nope");
        assert_eq!(
            platform.infos(),
            vec![(true, "done".to_string()), (false, "nope".to_string())]
        );
    }
}
