// SPDX-License-Identifier: GPL-3.0

use std::time::Duration;

/// A non-blocking message for the user, shown when a store action fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
}

impl Alert {
    /// How long a front-end should keep the alert on screen
    pub const DURATION: Duration = Duration::from_secs(5);

    pub fn new<T>(message: T) -> Self
    where
        T: ToString,
    {
        Self {
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
