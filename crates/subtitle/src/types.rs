/// Window length assumed for a cue that has no end timestamp, in seconds.
pub const UNTERMINATED_CUE_WINDOW: f64 = 10.0;

/// One timestamped unit of transcript text.
///
/// `index` is the cue's position among successfully parsed cues and is the
/// identity used for active-cue tracking and scroll targeting; skipped
/// blocks never consume an index.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cue {
    pub index: usize,
    pub start_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_seconds: Option<f64>,
    pub text: String,
}

impl Cue {
    /// End of this cue's active window.
    pub fn window_end(&self) -> f64 {
        self.end_seconds
            .unwrap_or(self.start_seconds + UNTERMINATED_CUE_WINDOW)
    }
}

/// Emitted when the active cue changes. `scroll_to` carries the index the
/// host should bring into view; how (smooth, centered) is the host's
/// rendering concern.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CueChange {
    pub active: Option<usize>,
    pub scroll_to: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_end_defaults_past_start() {
        let cue = Cue {
            index: 0,
            start_seconds: 4.0,
            end_seconds: None,
            text: "open".into(),
        };
        assert_eq!(cue.window_end(), 4.0 + UNTERMINATED_CUE_WINDOW);
    }

    #[test]
    fn cue_omits_missing_end_on_the_wire() {
        let cue = Cue {
            index: 1,
            start_seconds: 1.0,
            end_seconds: None,
            text: "hi".into(),
        };
        let json = serde_json::to_value(&cue).unwrap();
        assert!(json.get("end_seconds").is_none());
        assert_eq!(json["index"], 1);
    }
}
