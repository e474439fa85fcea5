use serde::{Deserialize, Serialize};

use crate::feature::FeatureRecord;

pub const GOOD: &str = "#2e7d32";
pub const FAIR: &str = "#f9a825";
pub const POOR: &str = "#c62828";
pub const NEUTRAL: &str = "#9e9e9e";

/// Visual style of one primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub color: String,
    pub radius: f64,       // Marker radius in pixels (points only)
    pub weight: f64,       // Stroke width in pixels
    pub fill_opacity: f64,
}

impl Style {
    pub fn new(color: impl Into<String>, radius: f64) -> Self {
        Self { color: color.into(), radius, weight: 2.0, fill_opacity: 0.4 }
    }
}

/// How a layer chooses colors and marker sizes from feature attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StyleRule {
    /// One color for every feature.
    Fixed { color: String },
    /// 0-100 condition score: >= 70 good, >= 40 fair, otherwise poor.
    Condition { field: String },
    /// Crash severity, either a label ("fatal", "serious injury", ...) or a numeric level (1 = fatal).
    Severity { field: String },
    /// Letter grade A-F.
    Grade { field: String },
}

impl Default for StyleRule {
    fn default() -> Self { StyleRule::Fixed { color: "#1565c0".into() } }
}

impl StyleRule {
    pub fn style(&self, rec: &FeatureRecord) -> Style {
        match self {
            StyleRule::Fixed { color } => Style::new(color.as_str(), 5.0),
            StyleRule::Condition { field } => match rec.attr_f64(field) {
                Some(score) if score >= 70.0 => Style::new(GOOD, 4.0),
                Some(score) if score >= 40.0 => Style::new(FAIR, 5.0),
                Some(_) => Style::new(POOR, 6.0),
                None => Style::new(NEUTRAL, 4.0),
            },
            StyleRule::Severity { field } => severity_style(rec, field),
            StyleRule::Grade { field } => {
                let grade = rec.attr_str(field)
                    .and_then(|g| g.trim().chars().next())
                    .map(|c| c.to_ascii_uppercase());
                match grade {
                    Some('A') => Style::new(GOOD, 5.0),
                    Some('B') => Style::new("#7cb342", 5.0),
                    Some('C') => Style::new(FAIR, 5.0),
                    Some('D') => Style::new("#ef6c00", 5.0),
                    Some('F') => Style::new(POOR, 5.0),
                    _ => Style::new(NEUTRAL, 5.0),
                }
            }
        }
    }
}

fn severity_style(rec: &FeatureRecord, field: &str) -> Style {
    if let Some(level) = rec.attr_f64(field) {
        return match level as i64 {
            1 => Style::new(POOR, 8.0),
            2 => Style::new(FAIR, 6.0),
            _ => Style::new("#fdd835", 4.0),
        };
    }
    match rec.attr_str(field).map(|s| s.to_ascii_lowercase()) {
        Some(s) if s.contains("fatal") || s.contains("killed") => Style::new(POOR, 8.0),
        Some(s) if s.contains("serious") || s.contains("incapacitating") => Style::new(FAIR, 6.0),
        Some(_) => Style::new("#fdd835", 4.0),
        None => Style::new(NEUTRAL, 4.0),
    }
}

/// A labelled attribute shown in a popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupField {
    pub label: String,
    pub key: String,
}

/// Popup contents built from a feature's attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopupTemplate {
    #[serde(default)]
    pub title: Option<String>, // Attribute used as the bold heading
    #[serde(default)]
    pub fields: Vec<PopupField>,
}

impl PopupTemplate {
    pub fn new(title: Option<&str>, fields: &[(&str, &str)]) -> Self {
        Self {
            title: title.map(str::to_string),
            fields: fields.iter()
                .map(|(label, key)| PopupField { label: label.to_string(), key: key.to_string() })
                .collect(),
        }
    }

    /// Render as HTML lines separated by `<br/>`; values are escaped, missing ones show as N/A.
    pub fn render(&self, rec: &FeatureRecord) -> String {
        let mut lines = Vec::with_capacity(self.fields.len() + 1);
        if let Some(title) = self.title.as_deref().and_then(|key| rec.attr_str(key)) {
            lines.push(format!("<b>{}</b>", escape(&title)));
        }
        for field in &self.fields {
            let value = rec.attr_str(&field.key).unwrap_or_else(|| "N/A".into());
            lines.push(format!("{}: {}", escape(&field.label), escape(&value)));
        }
        lines.join("<br/>")
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::feature::FeatureRecord;

    fn rec(attrs: serde_json::Value) -> FeatureRecord {
        let mut value = attrs;
        value["the_geom"] = json!([0.0, 0.0]);
        FeatureRecord::from_value(0, &value, "the_geom").unwrap()
    }

    #[test]
    fn condition_thresholds() {
        let rule = StyleRule::Condition { field: "condition".into() };
        assert_eq!(rule.style(&rec(json!({"condition": 85}))).color, GOOD);
        assert_eq!(rule.style(&rec(json!({"condition": "70"}))).color, GOOD);
        assert_eq!(rule.style(&rec(json!({"condition": 40.0}))).color, FAIR);
        assert_eq!(rule.style(&rec(json!({"condition": 12}))).color, POOR);
        assert_eq!(rule.style(&rec(json!({}))).color, NEUTRAL);
    }

    #[test]
    fn severity_labels_and_levels() {
        let rule = StyleRule::Severity { field: "crash_sev".into() };
        let fatal = rule.style(&rec(json!({"crash_sev": "FATAL"})));
        assert_eq!((fatal.color.as_str(), fatal.radius), (POOR, 8.0));
        assert_eq!(rule.style(&rec(json!({"crash_sev": "Suspected Serious Injury"}))).color, FAIR);
        assert_eq!(rule.style(&rec(json!({"crash_sev": 1}))).color, POOR);
        assert_eq!(rule.style(&rec(json!({"crash_sev": "2"}))).color, FAIR);
        assert_eq!(rule.style(&rec(json!({"crash_sev": "possible injury"}))).radius, 4.0);
    }

    #[test]
    fn grade_letters() {
        let rule = StyleRule::Grade { field: "final_grade".into() };
        assert_eq!(rule.style(&rec(json!({"final_grade": "a"}))).color, GOOD);
        assert_eq!(rule.style(&rec(json!({"final_grade": "F"}))).color, POOR);
        assert_eq!(rule.style(&rec(json!({"final_grade": "Incomplete"}))).color, NEUTRAL);
    }

    #[test]
    fn popup_escapes_and_fills_missing() {
        let template = PopupTemplate::new(Some("name"), &[("Score", "condition"), ("Owner", "owner")]);
        let html = template.render(&rec(json!({"name": "A&B <Depot>", "condition": 55})));
        assert_eq!(html, "<b>A&amp;B &lt;Depot&gt;</b><br/>Score: 55<br/>Owner: N/A");
    }

    #[test]
    fn rules_deserialize_from_tagged_json() {
        let rule: StyleRule = serde_json::from_value(json!({"rule": "grade", "field": "final_grade"})).unwrap();
        assert_eq!(rule, StyleRule::Grade { field: "final_grade".into() });
    }
}
