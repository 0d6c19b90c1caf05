use chrono::{NaiveDate, NaiveDateTime};
use migravoice::config::PlannerConfig;
use migravoice::intent::{
    Candidate, Disambiguator, Intent, IntentClassifier, MutationKind, Resolution,
};
use migravoice::parser::{self, MedicationVocabulary, Transcript};
use migravoice::plan::{ConfirmType, Plan, PlanBuilder, Risk};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 28)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn vocab() -> MedicationVocabulary {
    MedicationVocabulary::from_names(&["Sumatriptan", "Ibuprofen"])
}

fn classify(text: &str) -> Vec<Candidate> {
    let transcript = Transcript::german(text, 0.95);
    let slots = parser::parse(&transcript, now(), &vocab());
    IntentClassifier::new(PlannerConfig::default().classification_floor).classify(&transcript, &slots)
}

#[test]
fn create_utterance_scores_high() {
    let candidates = classify("Ich habe Schmerzstufe 8 und Sumatriptan 50 genommen, jetzt");
    let top = &candidates[0];
    assert_eq!(top.intent, Intent::Mutation(MutationKind::Create));
    assert!(top.score >= 0.8, "score was {}", top.score);
}

#[test]
fn delete_utterance_wins_over_create() {
    let candidates = classify("Lösche den Eintrag von gestern");
    assert_eq!(candidates[0].intent, Intent::Mutation(MutationKind::Delete));
    assert!(candidates[0].score >= 0.8);
    assert!(!candidates
        .iter()
        .any(|c| c.intent == Intent::Mutation(MutationKind::Create)));
}

#[test]
fn question_scores_as_query() {
    let candidates = classify("Wie viele Einträge hatte ich letzte Woche?");
    assert_eq!(candidates[0].intent, Intent::Query);
}

#[test]
fn navigation_verbs_score_as_navigate() {
    let candidates = classify("Öffne den Kalender");
    assert_eq!(candidates[0].intent, Intent::Navigate);
}

#[test]
fn below_floor_yields_single_unsupported() {
    for text in ["", "blabla foo", "vierzig grad draußen"] {
        let candidates = classify(text);
        assert_eq!(candidates.len(), 1, "{text}");
        assert_eq!(candidates[0].intent, Intent::Unsupported);
        assert_eq!(candidates[0].score, 0.0);
    }
}

#[test]
fn scores_stay_in_bounds() {
    for text in [
        "Ich habe Schmerzstufe 10 und Sumatriptan und Ibuprofen genommen, jetzt, eintragen bitte",
        "Lösche den Eintrag",
        "Wie oft hatte ich Schmerzen?",
    ] {
        for candidate in classify(text) {
            assert!((0.0..=1.0).contains(&candidate.score), "{text}");
        }
    }
}

#[test]
fn mutation_outranks_query_on_tie() {
    assert!(Intent::Mutation(MutationKind::Create).specificity() > Intent::Query.specificity());
    assert!(Intent::Query.specificity() > Intent::Navigate.specificity());
    assert!(Intent::Navigate.specificity() > Intent::Unsupported.specificity());
}

#[test]
fn narrow_gap_triggers_disambiguation() {
    let disambiguator = Disambiguator::new(0.15, 0.9);
    let candidates = vec![
        Candidate::new(Intent::Query, 0.52),
        Candidate::new(Intent::Mutation(MutationKind::Create), 0.48),
    ];
    match disambiguator.resolve(&candidates) {
        Resolution::Ambiguous(first, second) => {
            assert_eq!(first.intent, Intent::Query);
            assert_eq!(second.intent, Intent::Mutation(MutationKind::Create));
            assert!(first.score >= second.score);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[test]
fn wide_gap_commits_directly() {
    let disambiguator = Disambiguator::new(0.15, 0.9);
    let candidates = vec![
        Candidate::new(Intent::Query, 0.8),
        Candidate::new(Intent::Navigate, 0.3),
    ];
    assert!(matches!(
        disambiguator.resolve(&candidates),
        Resolution::Committed(c) if c.intent == Intent::Query
    ));
}

#[test]
fn high_top_score_skips_disambiguation() {
    let disambiguator = Disambiguator::new(0.15, 0.9);
    let candidates = vec![
        Candidate::new(Intent::Query, 0.95),
        Candidate::new(Intent::Navigate, 0.88),
    ];
    assert!(matches!(
        disambiguator.resolve(&candidates),
        Resolution::Committed(_)
    ));
}

#[test]
fn builder_leaves_confident_create_unwrapped() {
    let builder = PlanBuilder::new(PlannerConfig::default());
    let transcript = Transcript::german("Ich habe Schmerzstufe 8 genommen, jetzt", 0.95);
    let slots = parser::parse(&transcript, now(), &vocab());
    let plan = builder.build(
        Intent::Mutation(MutationKind::Create),
        &slots,
        &transcript.text,
        0.95,
        now(),
    );
    match plan {
        Plan::Mutation(m) => {
            assert_eq!(m.risk, Risk::Low);
            assert_eq!(m.payload.pain_level, Some(8));
        }
        other => panic!("expected bare mutation, got {}", other.kind_name()),
    }
}

#[test]
fn builder_wraps_low_confidence_in_normal_confirmation() {
    let builder = PlanBuilder::new(PlannerConfig::default());
    let transcript = Transcript::german("Ich hatte Schmerzstufe 5", 0.95);
    let slots = parser::parse(&transcript, now(), &vocab());
    let plan = builder.build(
        Intent::Mutation(MutationKind::Create),
        &slots,
        &transcript.text,
        0.5,
        now(),
    );
    match plan {
        Plan::Confirm(c) => {
            assert_eq!(c.confirm_type, ConfirmType::Normal);
            assert!(matches!(*c.pending, Plan::Mutation(_)));
        }
        other => panic!("expected confirmation, got {}", other.kind_name()),
    }
}

#[test]
fn builder_wraps_delete_in_danger_confirmation() {
    let builder = PlanBuilder::new(PlannerConfig::default());
    let transcript = Transcript::german("Lösche den Eintrag von gestern", 0.95);
    let slots = parser::parse(&transcript, now(), &vocab());
    let plan = builder.build(
        Intent::Mutation(MutationKind::Delete),
        &slots,
        &transcript.text,
        0.9,
        now(),
    );
    match plan {
        Plan::Confirm(c) => {
            assert_eq!(c.confirm_type, ConfirmType::Danger);
            match *c.pending {
                Plan::Mutation(ref m) => assert_eq!(m.risk, Risk::High),
                ref other => panic!("expected mutation, got {}", other.kind_name()),
            }
        }
        other => panic!("expected danger confirmation, got {}", other.kind_name()),
    }
}

#[test]
fn builder_wraps_low_confidence_query() {
    let builder = PlanBuilder::new(PlannerConfig::default());
    let transcript = Transcript::german("Wie viele Einträge hatte ich?", 0.5);
    let slots = parser::parse(&transcript, now(), &vocab());
    let plan = builder.build(Intent::Query, &slots, &transcript.text, 0.45, now());
    match plan {
        Plan::Confirm(c) => {
            assert_eq!(c.confirm_type, ConfirmType::Normal);
            assert!(matches!(*c.pending, Plan::Query(_)));
        }
        other => panic!("expected confirmation, got {}", other.kind_name()),
    }
}

#[test]
fn builder_gates_navigate_on_confidence_only() {
    let builder = PlanBuilder::new(PlannerConfig::default());
    let transcript = Transcript::german("Öffne den Kalender", 0.95);
    let slots = parser::parse(&transcript, now(), &vocab());

    let confident = builder.build(Intent::Navigate, &slots, &transcript.text, 0.8, now());
    assert!(matches!(confident, Plan::Navigate(_)));

    let uncertain = builder.build(Intent::Navigate, &slots, &transcript.text, 0.4, now());
    match uncertain {
        Plan::Confirm(c) => assert!(matches!(*c.pending, Plan::Navigate(_))),
        other => panic!("expected confirmation, got {}", other.kind_name()),
    }
}

#[test]
fn plan_serializes_with_kind_tag() {
    let builder = PlanBuilder::new(PlannerConfig::default());
    let transcript = Transcript::german("Ich habe Schmerzstufe 8 genommen, jetzt", 0.95);
    let slots = parser::parse(&transcript, now(), &vocab());
    let plan = builder.build(
        Intent::Mutation(MutationKind::Create),
        &slots,
        &transcript.text,
        0.95,
        now(),
    );
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["kind"], "mutation");
    assert_eq!(json["risk"], "low");
}
