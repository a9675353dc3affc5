use crate::domains::contract::types::ClientContract;
use crate::domains::trainer::types::TrainerRegistration;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Closed set of placeholder tokens recognized in contract templates.
///
/// Two vocabularies share this enum: trainer-contract tokens filled from a
/// registration's company fields, and client-contract tokens filled from the
/// workshop's client contract. `DATE_DU_JOUR` belongs to both and is always
/// substituted by the resolver itself, never supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placeholder {
    // Trainer vocabulary
    NomEntreprise,
    FormeJuridique,
    CapitalSocial,
    RcsVille,
    NumeroRcs,
    AdresseSiege,
    NomRepresentant,
    FonctionRepresentant,
    NomAbregeEntreprise,
    EmailRepresentant,
    // Client vocabulary
    ClientCompanyName,
    ClientRepresentativeName,
    ClientAddress,
    ClientEmail,
    ClientCompanyRegistration,
    SignatureCode,
    WorkshopDate,
    SignatureStatus,
    // Shared
    DateDuJour,
}

impl Placeholder {
    /// The bracketed token as it appears in template text
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::NomEntreprise => "[NOM_ENTREPRISE]",
            Placeholder::FormeJuridique => "[FORME_JURIDIQUE]",
            Placeholder::CapitalSocial => "[CAPITAL_SOCIAL]",
            Placeholder::RcsVille => "[RCS_VILLE]",
            Placeholder::NumeroRcs => "[NUMERO_RCS]",
            Placeholder::AdresseSiege => "[ADRESSE_SIEGE]",
            Placeholder::NomRepresentant => "[NOM_REPRESENTANT]",
            Placeholder::FonctionRepresentant => "[FONCTION_REPRESENTANT]",
            Placeholder::NomAbregeEntreprise => "[NOM_ABREGE_ENTREPRISE]",
            Placeholder::EmailRepresentant => "[EMAIL_REPRESENTANT]",
            Placeholder::ClientCompanyName => "[CLIENT_COMPANY_NAME]",
            Placeholder::ClientRepresentativeName => "[CLIENT_REPRESENTATIVE_NAME]",
            Placeholder::ClientAddress => "[CLIENT_ADDRESS]",
            Placeholder::ClientEmail => "[CLIENT_EMAIL]",
            Placeholder::ClientCompanyRegistration => "[CLIENT_COMPANY_REGISTRATION]",
            Placeholder::SignatureCode => "[SIGNATURE_CODE]",
            Placeholder::WorkshopDate => "[WORKSHOP_DATE]",
            Placeholder::SignatureStatus => "[SIGNATURE_STATUS]",
            Placeholder::DateDuJour => "[DATE_DU_JOUR]",
        }
    }

    /// Every recognized placeholder
    pub const ALL: &'static [Placeholder] = &[
        Placeholder::NomEntreprise,
        Placeholder::FormeJuridique,
        Placeholder::CapitalSocial,
        Placeholder::RcsVille,
        Placeholder::NumeroRcs,
        Placeholder::AdresseSiege,
        Placeholder::NomRepresentant,
        Placeholder::FonctionRepresentant,
        Placeholder::NomAbregeEntreprise,
        Placeholder::EmailRepresentant,
        Placeholder::ClientCompanyName,
        Placeholder::ClientRepresentativeName,
        Placeholder::ClientAddress,
        Placeholder::ClientEmail,
        Placeholder::ClientCompanyRegistration,
        Placeholder::SignatureCode,
        Placeholder::WorkshopDate,
        Placeholder::SignatureStatus,
        Placeholder::DateDuJour,
    ];
}

/// Substitution values for one resolution pass.
///
/// Only tokens present in the context are replaced; everything else is left
/// verbatim in the output. Optional source fields that are absent or empty
/// are never inserted, so their tokens survive resolution unchanged.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: HashMap<Placeholder, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, placeholder: Placeholder, value: impl Into<String>) -> &mut Self {
        self.values.insert(placeholder, value.into());
        self
    }

    /// Insert only when the value is present and non-empty
    pub fn insert_opt(&mut self, placeholder: Placeholder, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if !v.trim().is_empty() {
                self.values.insert(placeholder, v.to_string());
            }
        }
        self
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Context for a trainer contract, filled from the registration's
    /// company fields
    pub fn for_trainer(registration: &TrainerRegistration) -> Self {
        let mut ctx = Self::new();
        ctx.insert_opt(Placeholder::NomEntreprise, registration.company_name.as_deref());
        ctx.insert_opt(Placeholder::FormeJuridique, registration.legal_form.as_deref());
        ctx.insert_opt(Placeholder::CapitalSocial, registration.share_capital.as_deref());
        ctx.insert_opt(Placeholder::RcsVille, registration.rcs_city.as_deref());
        ctx.insert_opt(Placeholder::NumeroRcs, registration.rcs_number.as_deref());
        ctx.insert_opt(
            Placeholder::AdresseSiege,
            registration.head_office_address.as_deref(),
        );
        ctx.insert_opt(
            Placeholder::NomRepresentant,
            registration.representative_name.as_deref(),
        );
        ctx.insert_opt(
            Placeholder::FonctionRepresentant,
            registration.representative_role.as_deref(),
        );
        ctx.insert_opt(
            Placeholder::NomAbregeEntreprise,
            registration.company_short_name.as_deref(),
        );
        ctx.insert_opt(
            Placeholder::EmailRepresentant,
            registration.representative_email.as_deref(),
        );
        ctx
    }

    /// Context for the client contract of a workshop
    pub fn for_client(contract: &ClientContract) -> Self {
        let mut ctx = Self::new();
        ctx.insert(
            Placeholder::ClientCompanyName,
            contract.client_company_name.clone(),
        );
        ctx.insert(
            Placeholder::ClientRepresentativeName,
            contract.client_representative_name.clone(),
        );
        ctx.insert_opt(Placeholder::ClientAddress, contract.client_address.as_deref());
        ctx.insert(Placeholder::ClientEmail, contract.client_email.clone());
        ctx.insert_opt(
            Placeholder::ClientCompanyRegistration,
            contract.client_company_registration.as_deref(),
        );
        ctx.insert(Placeholder::SignatureCode, contract.signature_code.clone());
        ctx.insert(
            Placeholder::WorkshopDate,
            format_workshop_date(&contract.workshop_date),
        );
        ctx.insert(
            Placeholder::SignatureStatus,
            signature_status(contract.is_signed, contract.signed_at),
        );
        ctx
    }
}

/// Resolve a template against a context.
///
/// Total over any input: every occurrence of every context token is replaced,
/// `[DATE_DU_JOUR]` is replaced with today's date regardless of the context,
/// and anything else (unknown tokens, tokens without a value, stray
/// brackets) is copied through verbatim. Substituted values are emitted
/// literally and never rescanned, so a value containing token text cannot
/// trigger further expansion.
pub fn resolve(template: &str, context: &TemplateContext) -> String {
    let today = today_long_date();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('[') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let mut matched = None;
        for placeholder in Placeholder::ALL {
            let token = placeholder.token();
            if !tail.starts_with(token) {
                continue;
            }
            if *placeholder == Placeholder::DateDuJour {
                matched = Some((today.as_str(), token.len()));
            } else if let Some(value) = context.get(*placeholder) {
                matched = Some((value, token.len()));
            }
            break;
        }

        match matched {
            Some((value, token_len)) => {
                out.push_str(value);
                rest = &tail[token_len..];
            }
            None => {
                out.push('[');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Derived signature status string for client contracts
pub fn signature_status(is_signed: bool, signed_at: Option<DateTime<Utc>>) -> String {
    match (is_signed, signed_at) {
        (true, Some(at)) => format!("Signé le {}", format_long_date(at.date_naive())),
        _ => "En attente de signature".to_string(),
    }
}

const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Long-form French date: day, full month name, year
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        FRENCH_MONTHS[date.month0() as usize],
        date.year()
    )
}

fn today_long_date() -> String {
    format_long_date(chrono::Local::now().date_naive())
}

/// Workshop dates are stored as YYYY-MM-DD; presented long-form when parseable
fn format_workshop_date(workshop_date: &str) -> String {
    match NaiveDate::parse_from_str(workshop_date, "%Y-%m-%d") {
        Ok(date) => format_long_date(date),
        Err(_) => workshop_date.to_string(),
    }
}
