// src/form/render.rs
//
// Pure mapping from question definitions to HTML fragments. No state: the
// embedder re-applies field values after (re)rendering.

use crate::form::{ProgressState, StepKind, StepView};
use crate::models::question::{InputKind, QuestionDefinition};
use crate::utils::html::{clean_html, escape_attr};

/// Renders one form field: label, optional description, the input(s) for
/// the question's kind, and an empty per-field error slot.
pub fn render_field(def: &QuestionDefinition) -> String {
    let name = escape_attr(&def.indicator);
    let id = field_dom_id(def);
    let required_attr = if def.required { " required" } else { "" };

    let input_html = match def.input_kind.as_ref() {
        Some(InputKind::SingleLineText) | Some(InputKind::Email) | Some(InputKind::Number) => {
            let input_type = match def.input_kind.as_ref() {
                Some(InputKind::Email) => "email",
                Some(InputKind::Number) => "number",
                _ => "text",
            };
            format!(
                r#"<input type="{input_type}" id="{id}" name="{name}"{required_attr}>"#
            )
        }
        Some(InputKind::MultilineText) => format!(
            r#"<textarea id="{id}" name="{name}" rows="5"{required_attr}></textarea>"#
        ),
        Some(InputKind::SingleSelect) => {
            let mut html = String::from(r#"<div class="singleSelect-group">"#);
            if def.options.is_empty() {
                tracing::warn!(
                    title = %def.title,
                    "Select question has no options"
                );
                html.push_str(r#"<p style="color:red;">Options manquantes pour cette question.</p>"#);
            } else {
                for option in &def.options {
                    let option_id = option_dom_id(&id, option);
                    let value = escape_attr(option);
                    let label = clean_html(option);
                    html.push_str(&format!(
                        r#"<input type="radio" id="{option_id}" name="{name}" value="{value}"{required_attr}><label for="{option_id}">{label}</label><br>"#
                    ));
                }
            }
            html.push_str("</div>");
            html
        }
        Some(InputKind::Checkbox) => {
            let mut html = String::from(r#"<div class="checkbox-group">"#);
            if def.options.is_empty() {
                // Optionless checkbox degrades to a single boolean input.
                html.push_str(&format!(
                    r#"<input type="checkbox" id="{id}" name="{name}" value="Oui"{required_attr}><label for="{id}">Oui</label>"#
                ));
            } else {
                for option in &def.options {
                    let option_id = option_dom_id(&id, option);
                    let value = escape_attr(option);
                    let label = clean_html(option);
                    html.push_str(&format!(
                        r#"<input type="checkbox" id="{option_id}" name="{name}" value="{value}"{required_attr}><label for="{option_id}">{label}</label><br>"#
                    ));
                }
            }
            html.push_str("</div>");
            html
        }
        Some(InputKind::Date) => format!(
            r#"<input type="date" id="{id}" name="{name}"{required_attr}>"#
        ),
        Some(InputKind::Unknown(tag)) => {
            tracing::warn!(kind = %tag, title = %def.title, "Unhandled question kind");
            format!(
                r#"<input type="text" id="{id}" name="{name}"{required_attr} placeholder="Type non géré">"#
            )
        }
        None => {
            // Unusable definitions are filtered before rendering; this is
            // the same fallback as an unknown tag.
            format!(r#"<input type="text" id="{id}" name="{name}"{required_attr}>"#)
        }
    };

    let full_width = if matches!(def.input_kind, Some(InputKind::MultilineText)) {
        " full-width"
    } else {
        ""
    };
    let description_html = if def.description.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p class="question-description">{}</p>"#,
            clean_html(&def.description)
        )
    };

    format!(
        r#"<div class="form-field{full_width}"><label for="{id}">{title}</label>{description_html}{input_html}<div class="form-field-error-message"></div></div>"#,
        title = clean_html(&def.title),
    )
}

/// Renders a whole step: navigation, the field grid, the step status slot
/// and the advance button.
pub fn render_step(step: &StepView, visual_number: usize) -> String {
    let heading = match &step.kind {
        StepKind::Intro => "Bienvenue".to_string(),
        StepKind::Identity => "Fournisseur et produit".to_string(),
        StepKind::Stage(_) => format!("Étape {} : Questions sur l'impact", visual_number),
        StepKind::Final => "Récapitulatif".to_string(),
    };

    let fields: String = step
        .fields
        .iter()
        .map(|f| render_field(&f.def))
        .collect();

    format!(
        concat!(
            r#"<div class="form-step" data-step="{n}">"#,
            r#"<div class="form-navigation">"#,
            r#"<button type="button" class="arrow-button prev-step">←</button>"#,
            "<h3>{heading}</h3></div>",
            r#"<div class="form-grid">{fields}</div>"#,
            r#"<p class="form-status"></p>"#,
            r#"<button type="button" class="button next-step">SUIVANT</button>"#,
            "</div>"
        ),
        n = visual_number,
        heading = heading,
        fields = fields,
    )
}

/// Renders the progress bar: one numbered step per page, one segment
/// between consecutive pages, with active classes from the progress state.
pub fn render_progress(progress: &ProgressState) -> String {
    let mut html = String::new();
    let total = progress.reached.len();
    for i in 0..total {
        let step_class = if progress.reached[i] { "step active" } else { "step" };
        html.push_str(&format!(
            r#"<div class="step-wrapper"><div class="{step_class}" data-step="{n}">{n}</div>"#,
            n = i + 1,
        ));
        if i < total - 1 {
            let segment_class = if progress.completed[i] {
                "progress-segment active"
            } else {
                "progress-segment"
            };
            html.push_str(&format!(
                r#"<div class="{segment_class}" data-segment="{}"></div>"#,
                i + 1
            ));
        }
        html.push_str("</div>");
    }
    html
}

fn field_dom_id(def: &QuestionDefinition) -> String {
    if def.id.is_empty() {
        format!("question-{}", slugify(&def.indicator))
    } else {
        format!("question-{}", slugify(&def.id))
    }
}

fn option_dom_id(field_id: &str, option: &str) -> String {
    format!("{field_id}-{}", slugify(&option.to_lowercase()))
}

fn slugify(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
