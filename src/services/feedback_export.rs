//! Builds the chat message summarising an interview.

use chrono::Utc;
use serde_json::Value;

use crate::models::{InterviewerNotes, Role, SessionRecord, SlackAttachment, SlackField, SlackMessage};

const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";

fn field(title: &str, value: String, short: bool) -> SlackField {
    SlackField { title: title.to_string(), value, short }
}

fn recommendation_style(recommendation: &str) -> (&'static str, String) {
    match recommendation {
        "STRONG_HIRE" => ("#4caf50", "✅ Strong Hire".to_string()),
        "HIRE" => ("#8bc34a", "✅ Hire".to_string()),
        "PROCEED_TO_NEXT_ROUND" => ("#2196f3", "➡️ Next Round".to_string()),
        "MAYBE" => ("#ff9800", "🤔 Maybe".to_string()),
        "NO_HIRE" => ("#f44336", "❌ No Hire".to_string()),
        other => ("#666666", other.to_string()),
    }
}

/// Pick the candidate's display name. Ended sessions use the preserved roster.
pub fn candidate_name(session: &SessionRecord) -> String {
    if session.is_terminated() && !session.preserved_participants.is_empty() {
        return session
            .preserved_participants
            .values()
            .map(|p| p.name.as_str())
            .find(|name| looks_like_candidate(name))
            .unwrap_or(UNKNOWN_CANDIDATE)
            .to_string();
    }
    session
        .users
        .values()
        .find(|u| u.role == Role::Candidate && looks_like_candidate(&u.name))
        .map(|u| u.name.clone())
        .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string())
}

// Preserved records carry no role, so interviewer-looking names are skipped.
fn looks_like_candidate(name: &str) -> bool {
    let lower = name.to_lowercase();
    !lower.is_empty() && !lower.contains("interviewer") && !lower.contains('@') && !lower.contains("admin")
}

fn number(summary: &Value, key: &str) -> f64 {
    summary.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn display(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Behaviour metrics attachment built from an activity summary.
pub fn activity_attachment(summary: &Value) -> SlackAttachment {
    let score = number(summary, "activityScore");
    let tab_switches = number(summary, "tabSwitches");
    let idle_seconds = [number(summary, "totalIdleSeconds"), number(summary, "totalIdleTime")]
        .into_iter()
        .find(|v| *v != 0.0)
        .unwrap_or(0.0);
    let mut duration_seconds = number(summary, "sessionDuration");
    if duration_seconds == 0.0 {
        duration_seconds = number(summary, "sessionDurationMinutes") * 60.0;
    }
    let idle_percentage = if duration_seconds > 0.0 { (idle_seconds / duration_seconds * 100.0).round() } else { 0.0 };
    let notable = match summary.get("suspiciousPatterns") {
        Some(Value::Array(patterns)) => patterns.len() as f64,
        Some(other) => other.as_f64().unwrap_or(0.0),
        None => 0.0,
    };

    let color = if score > 80.0 {
        "#4caf50"
    } else if score > 60.0 {
        "#ff9800"
    } else {
        "#ff0000"
    };
    let engagement = if score < 60.0 {
        "🚨 Low Engagement"
    } else if score < 80.0 {
        "⚠️ Medium Engagement"
    } else {
        "✅ High Engagement"
    };
    let footer = if notable > 0.0 {
        format!("⚠️ {} notable behaviors detected", display(notable))
    } else {
        "✅ Normal activity patterns".to_string()
    };

    SlackAttachment {
        color: color.to_string(),
        title: "📊 Candidate Behavior Metrics".to_string(),
        fields: vec![
            field("Engagement Level", engagement.to_string(), true),
            field("Activity Score", format!("{}/100", display(score)), true),
            field("Tab Switches", format!("{}{}", display(tab_switches), if tab_switches > 10.0 { " ⚠️" } else { "" }), true),
            field("Idle Time", format!("{}min ({}%)", display((idle_seconds / 60.0).round()), display(idle_percentage)), true),
            field("Idle Periods", display(number(summary, "idlePeriods")), true),
            field("Session Duration", format!("{} min", display((duration_seconds / 60.0).round())), true),
        ],
        footer: Some(footer),
        ts: None,
    }
}

/// Full feedback message for one session.
pub fn feedback_message(
    code: &str,
    candidate: &str,
    notes: Option<&InterviewerNotes>,
    activity: Option<&Value>,
) -> SlackMessage {
    let recommendation = notes
        .and_then(|n| n.recommendation.as_deref())
        .filter(|r| !r.is_empty())
        .unwrap_or("No recommendation");
    let rating = notes.and_then(|n| n.rating.as_ref()).map_or(0, |r| r.overall.min(5)) as usize;
    let content = notes.map(|n| n.content.as_str()).filter(|c| !c.is_empty()).unwrap_or("No notes");
    let tags = notes.map(|n| n.tags.join(", ")).filter(|t| !t.is_empty()).unwrap_or_else(|| "None".to_string());
    let (color, label) = recommendation_style(recommendation);

    let mut attachments = vec![SlackAttachment {
        color: color.to_string(),
        title: format!("Interview Session: {}", code),
        fields: vec![
            field("Candidate", candidate.to_string(), true),
            field("Recommendation", label, true),
            field("Rating", format!("{} ({}/5)", "⭐".repeat(rating), rating), true),
            field("Session Code", code.to_string(), true),
            field("Tags", tags, false),
            field("Interview Notes", content.to_string(), false),
        ],
        footer: Some("Interview Platform".to_string()),
        ts: Some(Utc::now().timestamp()),
    }];
    if let Some(summary) = activity {
        attachments.push(activity_attachment(summary));
    }

    SlackMessage { text: format!("Interview Feedback for {}", candidate), attachments }
}
