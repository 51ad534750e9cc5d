use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Voice as listed by ElevenLabs, passed through without transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    #[serde(alias = "voice_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct VoicesPayload {
    pub voices: Vec<VoiceDescriptor>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

const LANGUAGE_LABEL_KEYS: [&str; 2] = ["language", "accent"];

impl VoiceDescriptor {
    fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn speaks(&self, language_tag: &str) -> bool {
        let tag = language_tag.trim();
        LANGUAGE_LABEL_KEYS
            .iter()
            .filter_map(|key| self.label(key))
            .any(|value| value.trim().eq_ignore_ascii_case(tag))
    }

    pub fn has_labels(&self, required: &BTreeMap<String, String>) -> bool {
        required.iter().all(|(key, wanted)| {
            self.label(key)
                .map(|value| value.trim().eq_ignore_ascii_case(wanted.trim()))
                .unwrap_or(false)
        })
    }
}

/// First voice, in vendor order, whose language (or accent) label equals the
/// tag and which carries every extra label requested.
pub fn find_voice<'a>(
    voices: &'a [VoiceDescriptor],
    language_tag: &str,
    extra_labels: &BTreeMap<String, String>,
) -> Option<&'a VoiceDescriptor> {
    voices
        .iter()
        .find(|v| v.speaks(language_tag) && v.has_labels(extra_labels))
}
