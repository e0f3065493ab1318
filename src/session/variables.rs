use std::collections::BTreeMap;
use std::fmt;

/// Context injected into a vendor session to personalise the agent
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DynamicVariables {
    pub user_name: String,
    pub phone_number: String,
    pub bot_name: String,
    pub system_prompt: String,
    pub opening_message: String,
    pub summary: String,
    pub bearer_token: String,
}

impl DynamicVariables {
    /// Wire form, keyed by the variable names the agent template uses
    pub fn to_map(&self) -> BTreeMap<String, String> {
        [
            ("user_name", &self.user_name),
            ("phone_number", &self.phone_number),
            ("bot_name", &self.bot_name),
            ("system_prompt", &self.system_prompt),
            ("opening_message", &self.opening_message),
            ("summary", &self.summary),
            ("bearer_token", &self.bearer_token),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

// Keep the token out of logs
impl fmt::Debug for DynamicVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicVariables")
            .field("user_name", &self.user_name)
            .field("phone_number", &self.phone_number)
            .field("bot_name", &self.bot_name)
            .field("system_prompt_len", &self.system_prompt.len())
            .field("opening_message", &self.opening_message)
            .field("summary_len", &self.summary.len())
            .field("bearer_token", &"[REDACTED]")
            .finish()
    }
}

/// Localised system prompt for the agent
///
/// Known languages: `en`, `hi`. Anything else gets English.
pub fn system_prompt(language: &str, cultural_preference: &str, bot_name: &str) -> String {
    match language {
        "hi" => format!(
            "आप {bot_name} हैं, एक स्नेही और धैर्यवान साथी। उपयोगकर्ता से हिंदी में, \
             सरल शब्दों में बात करें। बातचीत में {cultural_preference} सांस्कृतिक संदर्भों और \
             रीति-रिवाजों का ध्यान रखें। उत्तर छोटे रखें और हर बार एक ही प्रश्न पूछें।"
        ),
        _ => format!(
            "You are {bot_name}, a warm and patient companion. Speak in simple English. \
             Keep the user's {cultural_preference} cultural background, customs and festivals \
             in mind. Keep replies short and ask at most one question at a time."
        ),
    }
}
