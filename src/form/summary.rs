// src/form/summary.rs

use crate::models::answer::{AnswerMap, PRODUCT_FIELDS, SUPPLIER_FIELDS};
use crate::models::question::QuestionDefinition;
use crate::utils::html::clean_html;

const NOT_PROVIDED: &str = "Non renseigné";

/// Builds the human-readable recap shown on the terminal step: supplier
/// and product identity first, then every catalog question with its
/// collected answer. Missing or blank answers render as "Non renseigné";
/// sequences join with ", ".
pub fn generate(answers: &AnswerMap, catalog: &[QuestionDefinition]) -> String {
    let mut html = String::new();

    html.push_str("<h4>Informations Fournisseur</h4>");
    for (key, label) in SUPPLIER_FIELDS.iter().zip([
        "Prénom",
        "Nom",
        "Email",
        "Entreprise",
        "SIRET",
    ]) {
        push_present(&mut html, answers, key, label);
    }

    html.push_str(r#"<h4 style="margin-top: 20px;">Informations Produit</h4>"#);
    for (key, label) in PRODUCT_FIELDS
        .iter()
        .zip(["Nom du produit", "Description du produit"])
    {
        push_present(&mut html, answers, key, label);
    }

    html.push_str(r#"<h4 style="margin-top: 20px;">Questions Dynamiques</h4>"#);
    for question in catalog {
        let rendered = match answers.get(&question.indicator) {
            Some(value) if !value.is_blank() => value.joined(),
            _ => NOT_PROVIDED.to_string(),
        };
        html.push_str(&format!(
            "<p><strong>{}:</strong> {}</p>",
            clean_html(&question.title),
            clean_html(&rendered)
        ));
    }

    html
}

/// Identity lines are only listed when an answer exists.
fn push_present(html: &mut String, answers: &AnswerMap, key: &str, label: &str) {
    if let Some(value) = answers.get(key) {
        if !value.is_blank() {
            html.push_str(&format!(
                "<p><strong>{label}:</strong> {}</p>",
                clean_html(&value.joined())
            ));
        }
    }
}
