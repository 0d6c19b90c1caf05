use chrono::{NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::config::PlannerConfig;
use crate::intent::{Intent, MutationKind};
use crate::parser::ParsedSlots;

use super::types::{
    ConfirmPlan, ConfirmType, EffectRating, EntryPayload, EntryRef, MutationPlan, NavigatePlan,
    NavigateTarget, NotSupportedPlan, Plan, QueryFilters, QueryKind, QueryPlan, Risk, Suggestion,
};

/// Assembles the final plan for a committed intent and wraps it in a
/// confirmation step when risk or low confidence demands one.
pub struct PlanBuilder {
    config: PlannerConfig,
}

impl PlanBuilder {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// `confidence` is the classifier score already scaled by capture
    /// confidence; always clamped to [0,1] on the way in.
    pub fn build(
        &self,
        intent: Intent,
        slots: &ParsedSlots,
        transcript_text: &str,
        confidence: f32,
        now: NaiveDateTime,
    ) -> Plan {
        let confidence = confidence.clamp(0.0, 1.0);
        let text = transcript_text.to_lowercase();

        let plan = match intent {
            Intent::Navigate => Plan::Navigate(self.navigate(&text, confidence)),
            Intent::Query => Plan::Query(self.query(&text, slots, confidence)),
            Intent::Mutation(kind) => Plan::Mutation(self.mutation(kind, slots, &text, confidence, now)),
            Intent::Unsupported => Plan::NotSupported(self.not_supported(
                "Das habe ich nicht verstanden.".to_string(),
                confidence,
            )),
        };
        debug!(kind = plan.kind_name(), confidence, "built plan");

        self.gate(plan)
    }

    /// Confirmation gate: medium/high risk or sub-threshold confidence
    /// never reaches the executor directly. Risk only exists for
    /// mutations; queries and navigation still gate on confidence.
    pub(crate) fn gate(&self, plan: Plan) -> Plan {
        let (risk, confidence) = match &plan {
            Plan::Mutation(m) => (m.risk, m.confidence),
            Plan::Query(q) => (Risk::Low, q.confidence),
            Plan::Navigate(n) => (Risk::Low, n.confidence),
            _ => return plan,
        };
        let risky = risk >= Risk::Medium;
        let uncertain = confidence < self.config.confirmation_threshold;
        if !risky && !uncertain {
            return plan;
        }

        let confirm_type = if risk == Risk::High {
            ConfirmType::Danger
        } else {
            ConfirmType::Normal
        };
        let question = match confirm_type {
            ConfirmType::Danger => format!("{} — wirklich fortfahren?", plan.summary()),
            ConfirmType::Normal => format!("{} — passt das?", plan.summary()),
        };
        Plan::Confirm(ConfirmPlan {
            pending: Box::new(plan),
            question,
            confirm_type,
            confidence,
        })
    }

    fn navigate(&self, text: &str, confidence: f32) -> NavigatePlan {
        let target = if text.contains("kalender") {
            NavigateTarget::Calendar
        } else if text.contains("verlauf") || text.contains("historie") {
            NavigateTarget::History
        } else if text.contains("einstellung") {
            NavigateTarget::Settings
        } else if text.contains("bericht") || text.contains("report") {
            NavigateTarget::Report
        } else {
            NavigateTarget::Overview
        };
        let summary = match target {
            NavigateTarget::Calendar => "Kalender öffnen",
            NavigateTarget::History => "Verlauf öffnen",
            NavigateTarget::Settings => "Einstellungen öffnen",
            NavigateTarget::Report => "Bericht öffnen",
            NavigateTarget::Overview => "Übersicht öffnen",
        };
        NavigatePlan {
            target,
            summary: summary.to_string(),
            confidence,
        }
    }

    fn query(&self, text: &str, slots: &ParsedSlots, confidence: f32) -> QueryPlan {
        let query_kind = if text.contains("wie viele") || text.contains("wie oft") {
            QueryKind::EntryCount
        } else if text.contains("durchschnitt") || text.contains("wie stark") {
            QueryKind::PainAverage
        } else if !slots.medications.is_empty() {
            QueryKind::MedicationUsage
        } else {
            QueryKind::LastEntries
        };

        let filters = QueryFilters {
            from: slots.date,
            to: slots.date,
            medication: slots.medications.first().map(|m| m.name.clone()),
            min_pain: slots.pain_level,
        };

        let summary = match query_kind {
            QueryKind::EntryCount => "Einträge zählen",
            QueryKind::PainAverage => "Durchschnittliche Schmerzstufe abfragen",
            QueryKind::MedicationUsage => "Medikamenteneinnahme abfragen",
            QueryKind::LastEntries => "Letzte Einträge abfragen",
        };
        QueryPlan {
            query_kind,
            filters,
            summary: summary.to_string(),
            confidence,
        }
    }

    fn mutation(
        &self,
        kind: MutationKind,
        slots: &ParsedSlots,
        text: &str,
        confidence: f32,
        now: NaiveDateTime,
    ) -> MutationPlan {
        let date = slots.date.unwrap_or_else(|| now.date());
        let time = slots.time.unwrap_or_else(|| {
            if slots.is_now || slots.explicit_now {
                now.time()
            } else {
                NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(now.time())
            }
        });

        let entry_ref = match kind {
            MutationKind::Create => None,
            _ => Some(match slots.date {
                Some(d) => EntryRef::Date(d),
                None => EntryRef::Latest,
            }),
        };

        let effect = match kind {
            MutationKind::Rate => Some(effect_rating(text)),
            _ => None,
        };

        let payload = EntryPayload {
            timestamp: date.and_time(time),
            pain_level: slots.pain_level,
            medications: slots.medications.clone(),
            notes: slots.notes.clone(),
            tags: slots.tags.clone(),
            entry_ref,
            effect,
        };

        let risk = self.config.risk_tiers.for_kind(kind);
        let summary = mutation_summary(kind, &payload);

        MutationPlan {
            mutation_type: kind,
            payload,
            risk,
            summary,
            confidence,
        }
    }

    pub fn not_supported(&self, reason: String, confidence: f32) -> NotSupportedPlan {
        NotSupportedPlan {
            reason,
            suggestions: vec![
                Suggestion {
                    label: "Eintrag manuell anlegen".to_string(),
                    plan: None,
                },
                Suggestion {
                    label: "Übersicht öffnen".to_string(),
                    plan: Some(Box::new(Plan::Navigate(NavigatePlan {
                        target: NavigateTarget::Overview,
                        summary: "Übersicht öffnen".to_string(),
                        confidence: 1.0,
                    }))),
                },
            ],
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

fn effect_rating(text: &str) -> EffectRating {
    if text.contains("nicht geholfen") || text.contains("nicht gewirkt") {
        EffectRating::NotHelped
    } else if text.contains("teilweise") || text.contains("etwas geholfen") {
        EffectRating::Partial
    } else {
        EffectRating::Helped
    }
}

fn mutation_summary(kind: MutationKind, payload: &EntryPayload) -> String {
    match kind {
        MutationKind::Create => {
            let mut parts = Vec::new();
            if let Some(p) = payload.pain_level {
                parts.push(format!("Schmerzstufe {p}"));
            }
            for med in &payload.medications {
                parts.push(med.label());
            }
            if parts.is_empty() {
                parts.push("ohne Details".to_string());
            }
            format!(
                "Eintrag anlegen am {}: {}",
                payload.timestamp.format("%d.%m.%Y %H:%M"),
                parts.join(", ")
            )
        }
        MutationKind::Delete => format!("{} löschen", entry_ref_label(payload)),
        MutationKind::Update => format!("{} ändern", entry_ref_label(payload)),
        MutationKind::Rate => {
            let effect = match payload.effect {
                Some(EffectRating::Helped) => "hat geholfen",
                Some(EffectRating::Partial) => "hat teilweise geholfen",
                Some(EffectRating::NotHelped) => "hat nicht geholfen",
                None => "Wirkung unbekannt",
            };
            let med = payload
                .medications
                .first()
                .map(|m| m.name.clone())
                .unwrap_or_else(|| "Medikament".to_string());
            format!("Bewertung speichern: {med} {effect}")
        }
    }
}

fn entry_ref_label(payload: &EntryPayload) -> String {
    match &payload.entry_ref {
        Some(EntryRef::Date(d)) => format!("Eintrag vom {}", d.format("%d.%m.%Y")),
        Some(EntryRef::Id(id)) => format!("Eintrag {id}"),
        Some(EntryRef::Latest) | None => "Letzten Eintrag".to_string(),
    }
}
