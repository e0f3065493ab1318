//! Storage key names. These are shared with previously installed builds, so
//! the spelling (including the camelCase flags) must not change.

pub const TOKEN: &str = "token";
pub const NAME: &str = "name";
pub const PHONE_NUMBER: &str = "phone_number";
pub const CULTURAL_PREFERENCE: &str = "cultural_preference";
pub const ACCENT: &str = "accent";
pub const SETTINGS_JUST_UPDATED: &str = "settings_just_updated";
pub const SETTINGS_UPDATE_TIMESTAMP: &str = "settings_update_timestamp";
pub const IS_OTP_VERIFIED: &str = "isOtpVerified";
pub const IS_LOGGED_IN: &str = "isLoggedIn";
pub const LANGUAGE: &str = "language";
pub const TEXT_SIZE: &str = "text_size";
pub const ONBOARDING_COMPLETE: &str = "onboarding_complete";

/// Keys that belong to the signed-in account and are wiped on logout.
/// Language, text size and onboarding are device state and survive.
pub const ACCOUNT_KEYS: &[&str] = &[
    TOKEN,
    NAME,
    PHONE_NUMBER,
    CULTURAL_PREFERENCE,
    ACCENT,
    SETTINGS_JUST_UPDATED,
    SETTINGS_UPDATE_TIMESTAMP,
    IS_OTP_VERIFIED,
    IS_LOGGED_IN,
];
