//! Demo tasks standing in for Gmail and WhatsApp extraction.

use chrono::{DateTime, Utc};

use super::{Action, Citation, SourceType, Task, TaskStatus};

fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn action(label: &str, url: &str) -> Action {
    Action {
        label: label.into(),
        url: url.into(),
    }
}

/// The five seeded household tasks.
pub fn demo_tasks() -> Vec<Task> {
    vec![
        Task {
            id: "t1".into(),
            title: "Pay preschool deposit".into(),
            summary: "Email from Sunshine Preschool. Deposit due Aug 25.".into(),
            source_type: SourceType::Gmail,
            received_at: ts("2025-08-18T08:10:00-04:00"),
            due_at: Some(ts("2025-08-25T17:00:00-04:00")),
            savings_usd: None,
            importance: 92,
            urgency: 78,
            savings_score: 0,
            status: TaskStatus::Open,
            actions: vec![action("Open email", "https://mail.google.com/")],
            citations: Vec::new(),
        },
        Task {
            id: "t2".into(),
            title: "Use $150 airline credit (expires Friday)".into(),
            summary: "AmAir credit on file from June flight. Use toward fall trip.".into(),
            source_type: SourceType::Gmail,
            received_at: ts("2025-08-17T15:02:00-04:00"),
            due_at: Some(ts("2025-08-22T23:59:00-04:00")),
            savings_usd: Some(150.0),
            importance: 70,
            urgency: 65,
            savings_score: 88,
            status: TaskStatus::Open,
            actions: vec![action("Manage credit", "https://example-airline.com")],
            citations: vec![Citation {
                title: "Carrier credit policy".into(),
                url: "https://example-airline.com/policy".into(),
            }],
        },
        Task {
            id: "t3".into(),
            title: "Immunization records upload".into(),
            summary: "WhatsApp: 'School needs vax records by Wed'".into(),
            source_type: SourceType::Whatsapp,
            received_at: ts("2025-08-18T07:00:00-04:00"),
            due_at: Some(ts("2025-08-20T17:00:00-04:00")),
            savings_usd: None,
            importance: 95,
            urgency: 85,
            savings_score: 0,
            status: TaskStatus::Open,
            actions: vec![action("School portal", "https://school.example/portal")],
            citations: Vec::new(),
        },
        Task {
            id: "t4".into(),
            title: "Claim $75 pharmacy cashback".into(),
            summary: "CVS ExtraCare rewards ready to redeem.".into(),
            source_type: SourceType::Gmail,
            received_at: ts("2025-08-16T14:30:00-04:00"),
            due_at: Some(ts("2025-08-30T23:59:00-04:00")),
            savings_usd: Some(75.0),
            importance: 45,
            urgency: 35,
            savings_score: 72,
            status: TaskStatus::Open,
            actions: vec![action("CVS account", "https://cvs.com/account")],
            citations: Vec::new(),
        },
        Task {
            id: "t5".into(),
            title: "Schedule annual checkup".into(),
            summary: "Reminder from Dr. Smith's office for yearly physical.".into(),
            source_type: SourceType::Gmail,
            received_at: ts("2025-08-15T09:20:00-04:00"),
            due_at: None,
            savings_usd: None,
            importance: 75,
            urgency: 40,
            savings_score: 0,
            status: TaskStatus::Open,
            actions: vec![action("Patient portal", "https://mychart.example.com")],
            citations: Vec::new(),
        },
    ]
}
