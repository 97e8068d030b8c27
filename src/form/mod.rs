// src/form/mod.rs
//
// The multi-step intake form, re-expressed as a session state machine: one
// `FormSession` value owns the catalog, the step list with its editable
// field state, the collected answers and the current position, and every
// operation goes through it.

pub mod client;
pub mod render;
pub mod summary;

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use validator::ValidateEmail;

use crate::models::answer::{
    AnswerMap, AnswerValue, SubmissionPayload, SubmissionReceipt, TIMESTAMP_FIELD,
};
use crate::models::question::{InputKind, QuestionDefinition, normalize_catalog};

pub use client::{FormClient, FormError};

pub const SIRET_FIELD: &str = "siret_fournisseur";

static SIRET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{14}$").expect("siret pattern"));

const MSG_REQUIRED: &str = "Ce champ est requis.";
const MSG_EMAIL: &str = "Veuillez entrer une adresse email valide.";
const MSG_SIRET: &str = "Le numéro SIRET doit contenir 14 chiffres.";
const MSG_GROUP: &str = "Veuillez sélectionner au moins une option.";
const MSG_STEP_INVALID: &str = "Veuillez corriger les erreurs dans les champs requis.";

/// What a status line means, so an embedder can style it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusLine {
    fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), level: StatusLevel::Error }
    }
}

/// Static pages plus one generated page per catalog stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    Intro,
    /// Supplier and product identity fields.
    Identity,
    Stage(i64),
    /// Terminal summary step.
    Final,
}

/// Editable state of one rendered input (or input group).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Text(String),
    /// Radio group: at most one option.
    Choice(Option<String>),
    /// Checkbox group: the set of checked options.
    Multi(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub def: QuestionDefinition,
    pub input: FieldInput,
    pub error: Option<String>,
}

impl Field {
    fn new(def: QuestionDefinition) -> Self {
        let input = match def.input_kind {
            Some(InputKind::SingleSelect) => FieldInput::Choice(None),
            Some(InputKind::Checkbox) => FieldInput::Multi(Vec::new()),
            _ => FieldInput::Text(String::new()),
        };
        Self { def, input, error: None }
    }

    fn clear(&mut self) {
        self.input = match self.input {
            FieldInput::Text(_) => FieldInput::Text(String::new()),
            FieldInput::Choice(_) => FieldInput::Choice(None),
            FieldInput::Multi(_) => FieldInput::Multi(Vec::new()),
        };
        self.error = None;
    }

    fn is_blank(&self) -> bool {
        match &self.input {
            FieldInput::Text(v) => v.trim().is_empty(),
            FieldInput::Choice(v) => v.is_none(),
            FieldInput::Multi(v) => v.is_empty(),
        }
    }
}

/// One renderable form page.
#[derive(Debug, Clone)]
pub struct StepView {
    pub kind: StepKind,
    pub fields: Vec<Field>,
    pub status: Option<String>,
}

impl StepView {
    fn new(kind: StepKind, fields: Vec<Field>) -> Self {
        Self { kind, fields, status: None }
    }
}

/// Progress indicator state: every index up to the current step is
/// reached, every segment before it is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub reached: Vec<bool>,
    pub completed: Vec<bool>,
}

/// The form session. Single owner of all mutable form state.
#[derive(Debug, Clone)]
pub struct FormSession {
    catalog: Vec<QuestionDefinition>,
    steps: Vec<StepView>,
    current: usize,
    answers: AnswerMap,
    loaded: bool,
    status: Option<StatusLine>,
    summary: Option<String>,
}

/// Built-in definitions for the supplier/product identity step. These
/// fields are fixed (they feed the Supplier and Product tables), so they
/// are not part of the server catalog.
fn identity_definitions() -> Vec<QuestionDefinition> {
    fn fixed(
        indicator: &str,
        title: &str,
        kind: InputKind,
        required: bool,
    ) -> QuestionDefinition {
        QuestionDefinition {
            id: String::new(),
            stage: None,
            indicator: indicator.to_string(),
            title: title.to_string(),
            input_kind: Some(kind),
            options: Vec::new(),
            description: String::new(),
            required,
            coefficient: None,
            category: String::new(),
            order: 0,
            unit_energy_price: None,
        }
    }

    vec![
        fixed("prenom_fournisseur", "Prénom", InputKind::SingleLineText, true),
        fixed("nom_fournisseur", "Nom", InputKind::SingleLineText, true),
        fixed("email_fournisseur", "Email", InputKind::Email, true),
        fixed("entreprise_fournisseur", "Entreprise", InputKind::SingleLineText, true),
        fixed(SIRET_FIELD, "Numéro SIRET", InputKind::SingleLineText, true),
        fixed("nom_produit", "Nom du produit", InputKind::SingleLineText, true),
        fixed(
            "description_produit",
            "Description du produit",
            InputKind::MultilineText,
            false,
        ),
    ]
}

impl FormSession {
    pub fn new() -> Self {
        Self {
            catalog: Vec::new(),
            steps: static_steps(),
            current: 0,
            answers: AnswerMap::new(),
            loaded: false,
            status: None,
            summary: None,
        }
    }

    pub fn steps(&self) -> &[StepView] {
        &self.steps
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> &StepView {
        &self.steps[self.current]
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn catalog(&self) -> &[QuestionDefinition] {
        &self.catalog
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Fetches the catalog once. A failed or malformed fetch surfaces a
    /// display-only error and leaves all prior state untouched.
    pub async fn load_catalog(&mut self, client: &FormClient) -> Result<(), FormError> {
        if self.loaded {
            return Ok(());
        }
        match client.fetch_questions().await {
            Ok(raw) => {
                self.install_catalog(raw);
                Ok(())
            }
            Err(FormError::Malformed) => {
                self.status = Some(StatusLine::error(
                    "Erreur: Structure de données inattendue reçue du serveur.",
                ));
                Err(FormError::Malformed)
            }
            Err(err) => {
                self.status = Some(StatusLine::error(
                    "Erreur: Impossible de charger les questions du formulaire. \
                     Veuillez réessayer plus tard.",
                ));
                Err(err)
            }
        }
    }

    /// Installs a fetched catalog: drops unusable definitions, sorts by
    /// (stage, order), regenerates the dynamic steps between the identity
    /// and final pages. Static steps (and anything typed into them)
    /// survive.
    pub fn install_catalog(&mut self, raw: Vec<QuestionDefinition>) {
        self.catalog = normalize_catalog(raw);

        // Static steps survive a (re)load; previous stage steps are
        // discarded and regenerated from the fresh catalog.
        let mut old = std::mem::take(&mut self.steps).into_iter();
        let mut steps = Vec::with_capacity(self.catalog.len() + 3);
        steps.push(old.next().unwrap_or_else(|| StepView::new(StepKind::Intro, Vec::new())));
        steps.push(old.next().unwrap_or_else(|| {
            StepView::new(
                StepKind::Identity,
                identity_definitions().into_iter().map(Field::new).collect(),
            )
        }));
        let final_step = old
            .filter(|s| s.kind == StepKind::Final)
            .next_back()
            .unwrap_or_else(|| StepView::new(StepKind::Final, Vec::new()));

        for def in &self.catalog {
            let stage = def.stage.unwrap_or(0);
            match steps.last_mut() {
                Some(step) if step.kind == StepKind::Stage(stage) => {
                    step.fields.push(Field::new(def.clone()));
                }
                _ => {
                    steps.push(StepView::new(
                        StepKind::Stage(stage),
                        vec![Field::new(def.clone())],
                    ));
                }
            }
        }

        steps.push(final_step);
        self.steps = steps;
        self.loaded = true;
    }

    /// Activates one step. Index clamping is the caller's responsibility.
    pub fn show_step(&mut self, index: usize) {
        self.current = index;
    }

    pub fn progress(&self) -> ProgressState {
        let total = self.steps.len();
        ProgressState {
            reached: (0..total).map(|i| i <= self.current).collect(),
            completed: (0..total.saturating_sub(1))
                .map(|i| i < self.current)
                .collect(),
        }
    }

    /// Sets the value of a text-like field on the current step.
    pub fn set_value(&mut self, indicator: &str, value: &str) -> bool {
        match self.field_mut(indicator).map(|f| &mut f.input) {
            Some(FieldInput::Text(v)) => {
                *v = value.to_string();
                true
            }
            _ => false,
        }
    }

    /// Selects a radio option on the current step. Unknown options are
    /// ignored, like a browser ignores a value not present in the group.
    pub fn choose(&mut self, indicator: &str, option: &str) -> bool {
        let Some(field) = self.field_mut(indicator) else {
            return false;
        };
        if !field.def.options.iter().any(|o| o == option) {
            return false;
        }
        match &mut field.input {
            FieldInput::Choice(selected) => {
                *selected = Some(option.to_string());
                true
            }
            _ => false,
        }
    }

    /// Toggles a checkbox option on the current step. A checkbox rendered
    /// without options carries the single implicit value "Oui".
    pub fn toggle(&mut self, indicator: &str, option: &str) -> bool {
        let Some(field) = self.field_mut(indicator) else {
            return false;
        };
        let known = field.def.options.iter().any(|o| o == option)
            || (field.def.options.is_empty() && option == "Oui");
        if !known {
            return false;
        }
        match &mut field.input {
            FieldInput::Multi(selected) => {
                if let Some(pos) = selected.iter().position(|o| o == option) {
                    selected.remove(pos);
                } else {
                    selected.push(option.to_string());
                }
                true
            }
            _ => false,
        }
    }

    /// Validates one step. The intro and the terminal summary always pass;
    /// elsewhere every required field must be filled, emails must look
    /// like addresses, and a non-blank SIRET must be exactly 14 digits.
    /// Side-effects are presentation-only: per-field messages and the
    /// step status.
    pub fn validate_step(&mut self, index: usize) -> bool {
        let step = &mut self.steps[index];
        if matches!(step.kind, StepKind::Intro | StepKind::Final) {
            return true;
        }

        let mut valid = true;
        for field in &mut step.fields {
            field.error = None;
            if !field.def.required {
                continue;
            }

            let message = match (&field.def.input_kind, &field.input) {
                (_, FieldInput::Choice(_) | FieldInput::Multi(_)) => {
                    field.is_blank().then_some(MSG_GROUP)
                }
                (kind, FieldInput::Text(value)) => {
                    let value = value.trim();
                    if value.is_empty() {
                        Some(MSG_REQUIRED)
                    } else if matches!(kind, Some(InputKind::Email))
                        && !value.validate_email()
                    {
                        Some(MSG_EMAIL)
                    } else if field.def.indicator == SIRET_FIELD
                        && !SIRET_RE.is_match(value)
                    {
                        Some(MSG_SIRET)
                    } else {
                        None
                    }
                }
            };

            if let Some(message) = message {
                field.error = Some(message.to_string());
                valid = false;
            }
        }

        step.status = (!valid).then(|| MSG_STEP_INVALID.to_string());
        valid
    }

    /// Merges the step's field values into the answers map. Checkbox
    /// groups are re-initialized to empty first, so unchecking before
    /// advancing removes stale entries for this step only. Idempotent for
    /// unchanged field state.
    pub fn collect_step(&mut self, index: usize) {
        let step = &self.steps[index];

        for field in &step.fields {
            if matches!(field.input, FieldInput::Multi(_)) {
                self.answers
                    .insert(field.def.indicator.clone(), AnswerValue::Many(Vec::new()));
            }
        }

        for field in &step.fields {
            let key = field.def.indicator.clone();
            match &field.input {
                FieldInput::Text(value) => {
                    self.answers
                        .insert(key, AnswerValue::Text(value.trim().to_string()));
                }
                FieldInput::Choice(Some(value)) => {
                    self.answers
                        .insert(key, AnswerValue::Text(value.trim().to_string()));
                }
                FieldInput::Choice(None) => {}
                FieldInput::Multi(selected) => {
                    // Stored in option order, matching rendered order.
                    let ordered: Vec<String> = if field.def.options.is_empty() {
                        selected.clone()
                    } else {
                        field
                            .def
                            .options
                            .iter()
                            .filter(|o| selected.contains(o))
                            .cloned()
                            .collect()
                    };
                    self.answers.insert(key, AnswerValue::Many(ordered));
                }
            }
        }
    }

    /// Validates and collects the current step, then moves forward. On
    /// reaching the terminal step, builds the summary. Returns whether the
    /// step was valid.
    pub fn advance(&mut self) -> bool {
        if !self.validate_step(self.current) {
            return false;
        }
        self.collect_step(self.current);

        if self.current + 1 < self.steps.len() {
            self.show_step(self.current + 1);
            if self.steps[self.current].kind == StepKind::Final {
                self.summary = Some(summary::generate(&self.answers, &self.catalog));
            }
        }
        true
    }

    /// Moves back one step. Collected answers are preserved; nothing is
    /// validated.
    pub fn retreat(&mut self) {
        if self.current > 0 {
            self.show_step(self.current - 1);
        }
    }

    /// Clears everything and re-fetches the catalog, returning to step 0.
    pub async fn reset(&mut self, client: &FormClient) -> Result<(), FormError> {
        for step in &mut self.steps {
            for field in &mut step.fields {
                field.clear();
            }
            step.status = None;
        }
        self.answers.clear();
        self.status = None;
        self.summary = None;
        self.catalog.clear();
        self.steps = take_static_steps(std::mem::take(&mut self.steps));
        self.loaded = false;
        self.show_step(0);
        self.load_catalog(client).await
    }

    /// The wire payload: collected answers (stamped with the submission
    /// timestamp) plus the catalog the answers were gathered against.
    pub fn payload(&self) -> SubmissionPayload {
        let mut answers = self.answers.clone();
        answers.insert(
            TIMESTAMP_FIELD.to_string(),
            AnswerValue::Text(Utc::now().to_rfc3339()),
        );
        SubmissionPayload {
            answers,
            question_definitions: self.catalog.clone(),
        }
    }

    /// Submits the payload. Validation is not re-run; the last `advance`
    /// already validated the final input step. On success the form is
    /// cleared (inputs, answers and summary) and returns to step 0, ready
    /// for a new entry; on failure the answers survive so nothing has to
    /// be re-entered.
    pub async fn submit(&mut self, client: &FormClient) -> Result<SubmissionReceipt, FormError> {
        self.status = Some(StatusLine {
            text: "Envoi en cours...".to_string(),
            level: StatusLevel::Info,
        });

        match client.send(&self.payload()).await {
            Ok(receipt) => {
                self.status = Some(StatusLine {
                    text: "Formulaire soumis avec succès !".to_string(),
                    level: StatusLevel::Success,
                });
                for step in &mut self.steps {
                    for field in &mut step.fields {
                        field.clear();
                    }
                    step.status = None;
                }
                self.answers.clear();
                self.summary = None;
                self.show_step(0);
                Ok(receipt)
            }
            Err(FormError::Rejected(message)) => {
                self.status = Some(StatusLine::error(format!(
                    "Erreur lors de la soumission: {message}"
                )));
                Err(FormError::Rejected(message))
            }
            Err(err) => {
                self.status = Some(StatusLine::error(
                    "Erreur: Impossible de communiquer avec le serveur.",
                ));
                Err(err)
            }
        }
    }

    fn field_mut(&mut self, indicator: &str) -> Option<&mut Field> {
        self.steps[self.current]
            .fields
            .iter_mut()
            .find(|f| f.def.indicator == indicator)
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

fn static_steps() -> Vec<StepView> {
    vec![
        StepView::new(StepKind::Intro, Vec::new()),
        StepView::new(
            StepKind::Identity,
            identity_definitions().into_iter().map(Field::new).collect(),
        ),
        StepView::new(StepKind::Final, Vec::new()),
    ]
}

/// Keeps only the intro, identity and final steps (in that order),
/// discarding generated stage steps.
fn take_static_steps(steps: Vec<StepView>) -> Vec<StepView> {
    let mut kept: Vec<StepView> = steps
        .into_iter()
        .filter(|s| !matches!(s.kind, StepKind::Stage(_)))
        .collect();
    debug_assert_eq!(kept.len(), 3);
    if kept.len() != 3 {
        kept = static_steps();
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog_question(
        id: &str,
        stage: i64,
        indicator: &str,
        kind: &str,
        options: &[&str],
        required: bool,
        order: i64,
    ) -> QuestionDefinition {
        serde_json::from_value(json!({
            "id_question": id,
            "etape": stage,
            "indicateur_questions": indicator,
            "titre": format!("Question {indicator}"),
            "type_questions": kind,
            "options": options,
            "obligatoire": required,
            "ordre": order,
        }))
        .unwrap()
    }

    fn session_with_catalog() -> FormSession {
        let mut session = FormSession::new();
        session.install_catalog(vec![
            catalog_question("r3", 2, "MasseA", "number", &[], true, 1),
            catalog_question(
                "r1",
                1,
                "transport",
                "radio",
                &["Train", "Camion"],
                true,
                1,
            ),
            catalog_question(
                "r2",
                1,
                "labels",
                "checkbox",
                &["AB", "FSC", "OEKO"],
                false,
                2,
            ),
        ]);
        session
    }

    #[test]
    fn test_steps_grouped_by_stage_sorted_by_order() {
        let session = session_with_catalog();
        let kinds: Vec<&StepKind> = session.steps().iter().map(|s| &s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &StepKind::Intro,
                &StepKind::Identity,
                &StepKind::Stage(1),
                &StepKind::Stage(2),
                &StepKind::Final,
            ]
        );

        let stage1 = &session.steps()[2];
        let indicators: Vec<&str> = stage1
            .fields
            .iter()
            .map(|f| f.def.indicator.as_str())
            .collect();
        assert_eq!(indicators, vec!["transport", "labels"]);
    }

    #[test]
    fn test_intro_and_final_always_validate() {
        let mut session = session_with_catalog();
        assert!(session.validate_step(0));
        let last = session.steps().len() - 1;
        assert!(session.validate_step(last));
    }

    #[test]
    fn test_identity_validation_email_and_siret() {
        let mut session = session_with_catalog();
        session.show_step(1);
        session.set_value("prenom_fournisseur", "Léa");
        session.set_value("nom_fournisseur", "Martin");
        session.set_value("email_fournisseur", "not-an-email");
        session.set_value("entreprise_fournisseur", "Atelier");
        session.set_value(SIRET_FIELD, "1234");
        session.set_value("nom_produit", "Bague");

        assert!(!session.validate_step(1));
        let step = &session.steps()[1];
        let field_error = |ind: &str| {
            step.fields
                .iter()
                .find(|f| f.def.indicator == ind)
                .unwrap()
                .error
                .clone()
        };
        assert_eq!(field_error("email_fournisseur").unwrap(), MSG_EMAIL);
        assert_eq!(field_error(SIRET_FIELD).unwrap(), MSG_SIRET);
        assert_eq!(step.status.as_deref(), Some(MSG_STEP_INVALID));

        session.set_value("email_fournisseur", "a@b.co");
        session.set_value(SIRET_FIELD, "12345678901234");
        assert!(session.validate_step(1));
        assert!(session.steps()[1].status.is_none());
    }

    #[test]
    fn test_required_group_needs_a_selection() {
        let mut session = session_with_catalog();
        session.show_step(2);
        assert!(!session.validate_step(2));

        session.choose("transport", "Train");
        assert!(session.validate_step(2));
    }

    #[test]
    fn test_collect_step_is_idempotent() {
        let mut session = session_with_catalog();
        session.show_step(2);
        session.choose("transport", "Train");
        session.toggle("labels", "FSC");
        session.toggle("labels", "AB");

        session.collect_step(2);
        let first = session.answers().clone();
        session.collect_step(2);
        assert_eq!(session.answers(), &first);

        // Checkbox values come out in option order, not click order.
        assert_eq!(
            session.answers().get("labels"),
            Some(&AnswerValue::Many(vec!["AB".into(), "FSC".into()]))
        );
        assert_eq!(
            session.answers().get("transport"),
            Some(&AnswerValue::Text("Train".into()))
        );
    }

    #[test]
    fn test_unchecking_before_recollect_removes_stale_entries() {
        let mut session = session_with_catalog();
        session.show_step(2);
        session.choose("transport", "Train");
        session.toggle("labels", "FSC");
        session.collect_step(2);

        session.toggle("labels", "FSC"); // uncheck
        session.collect_step(2);
        assert_eq!(
            session.answers().get("labels"),
            Some(&AnswerValue::Many(Vec::new()))
        );
    }

    #[test]
    fn test_advance_blocks_on_invalid_step() {
        let mut session = session_with_catalog();
        session.show_step(2);
        assert!(!session.advance());
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn test_advance_to_final_builds_summary() {
        let mut session = session_with_catalog();
        session.show_step(2);
        session.choose("transport", "Camion");
        assert!(session.advance());

        // Now on the Stage(2) step.
        session.set_value("MasseA", "12.5");
        assert!(session.advance());

        assert_eq!(session.current_step().kind, StepKind::Final);
        let summary = session.summary_text().unwrap();
        assert!(summary.contains("Camion"));
        assert!(summary.contains("12.5"));
    }

    #[test]
    fn test_retreat_preserves_answers() {
        let mut session = session_with_catalog();
        session.show_step(2);
        session.choose("transport", "Train");
        session.advance();
        session.retreat();

        assert_eq!(session.current_index(), 2);
        assert_eq!(
            session.answers().get("transport"),
            Some(&AnswerValue::Text("Train".into()))
        );
    }

    #[test]
    fn test_progress_state() {
        let mut session = session_with_catalog();
        session.show_step(2);
        let progress = session.progress();
        assert_eq!(progress.reached, vec![true, true, true, false, false]);
        assert_eq!(progress.completed, vec![true, true, false, false]);
    }

    #[test]
    fn test_payload_contains_timestamp_and_catalog() {
        let mut session = session_with_catalog();
        session.show_step(2);
        session.choose("transport", "Train");
        session.collect_step(2);

        let payload = session.payload();
        assert!(payload.answers.contains_key(TIMESTAMP_FIELD));
        assert_eq!(payload.question_definitions.len(), 3);
        assert_eq!(
            payload.answers.get("transport"),
            Some(&AnswerValue::Text("Train".into()))
        );
    }
}
