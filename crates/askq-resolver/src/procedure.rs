// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Procedure catalog: the ordered keyword table resolvers search.
//!
//! Order is significant. A resolver returns the first procedure with any
//! matching keyword, so broader procedures listed early shadow narrower ones
//! listed later (e.g. "enrollment form" is answered by Enrollment).

use std::path::Path;

use askq_core::{Answer, AskqError, Category};
use serde::{Deserialize, Serialize};

/// One answerable procedure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Procedure {
    pub category: String,
    /// Lowercase phrases. Normalized on catalog construction.
    pub keywords: Vec<String>,
    pub answer: String,
}

impl Procedure {
    pub fn to_answer(&self) -> Answer {
        Answer {
            category: Some(self.category.clone()),
            text: self.answer.clone(),
        }
    }
}

/// Ordered procedures plus the fallback help text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    pub default_help: String,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
}

impl Catalog {
    pub fn new(procedures: Vec<Procedure>, default_help: impl Into<String>) -> Self {
        let mut catalog = Self {
            default_help: default_help.into(),
            procedures,
        };
        catalog.normalize();
        catalog
    }

    /// Parse a catalog from TOML:
    ///
    /// ```toml
    /// default_help = "Ask me about enrollment."
    ///
    /// [[procedures]]
    /// category = "Enrollment"
    /// keywords = ["enroll", "add subject"]
    /// answer = "Open the Registration tab..."
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, AskqError> {
        let mut catalog: Catalog = toml::from_str(content)
            .map_err(|e| AskqError::Config(format!("invalid procedure catalog: {e}")))?;
        catalog.normalize();
        Ok(catalog)
    }

    /// Read and parse a TOML catalog file.
    pub fn load(path: &Path) -> Result<Self, AskqError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AskqError::Config(format!(
                "cannot read procedure catalog {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn default_answer(&self) -> Answer {
        Answer {
            category: None,
            text: self.default_help.clone(),
        }
    }

    /// One entry per distinct category, in first-appearance order, paired
    /// with the first keyword of the procedure that introduced it.
    pub fn categories(&self) -> Vec<Category> {
        let mut out: Vec<Category> = Vec::new();
        for procedure in &self.procedures {
            if out.iter().any(|c| c.name == procedure.category) {
                continue;
            }
            if let Some(keyword) = procedure.keywords.first() {
                out.push(Category {
                    name: procedure.category.clone(),
                    keyword: keyword.clone(),
                });
            }
        }
        out
    }

    fn normalize(&mut self) {
        for procedure in &mut self.procedures {
            procedure.keywords = procedure
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
        }
    }
}

fn procedure(category: &str, keywords: &[&str], answer: &str) -> Procedure {
    Procedure {
        category: category.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        answer: answer.to_string(),
    }
}

const DEFAULT_HELP: &str = "\
Welcome to the student portal help desk.

I can walk you through:
- Enrollment: adding subjects for the semester
- Fee Payment: paying your assessed miscellaneous fees
- Other Payments: paying other portal fees
- Grades: checking your semester grades
- Schedule: viewing your class schedule
- Password: changing your portal password
- Documents: downloading your Registration Form and Statement of Account

Try asking \"How do I enroll?\", \"How do I pay my fees?\" or \"Where is my schedule?\"";

/// The catalog shipped with askq: the student portal procedures.
pub fn builtin_catalog() -> Catalog {
    Catalog::new(
        vec![
            procedure(
                "Enrollment",
                &["enroll", "enrollment", "register", "enlist", "add subject", "registration"],
                "Enrolling in subjects\n\
                 1. Log in to the portal and open the Registration tab.\n\
                 2. Pick your section from the section selector.\n\
                 3. Under Add Subjects, add each course offered for that section.\n\
                 4. Choose a schedule for every added subject.\n\
                 5. Click Assess to open the assessment page.\n\
                 6. Pay the miscellaneous fees; the portal then confirms you are officially enrolled.\n\
                 Check your official section with your department first. For problems, visit the Registrar's Office.",
            ),
            procedure(
                "Fee Payment",
                &[
                    "pay tuition",
                    "tuition fee",
                    "how to pay",
                    "miscellaneous fee",
                    "make payment",
                    "payment process",
                    "assessment fee",
                ],
                "Paying assessed fees\n\
                 1. On the assessment page, find the Total Tuition & Fees amount.\n\
                 2. Open the mode of payment selector and choose a method.\n\
                 3. Proceed with payment and follow the provider's instructions.\n\
                 4. Keep a copy of the transaction receipt or official receipt.\n\
                 Settle the fees before the deadline to validate your enrollment.",
            ),
            procedure(
                "Grades",
                &["grades", "grade", "gwa", "marks", "scores", "results"],
                "Checking grades\n\
                 1. Log in and open the Grades tab.\n\
                 2. Select the school year and semester.\n\
                 3. Review the grade shown for each subject.\n\
                 1.0 to 3.0 is passing, 4.0 to 5.0 is failing, INC means incomplete.",
            ),
            procedure(
                "Other Payments",
                &["other payments", "other fees"],
                "Paying other fees\n\
                 1. Log in and open Other Payments.\n\
                 2. Choose Other Fees and select your section.\n\
                 3. Pick the fee, enter quantity and amount.\n\
                 4. Click Continue to Payment to finish.\n\
                 If the portal reports an error, wait a moment and try again.",
            ),
            procedure(
                "Schedule",
                &["schedule", "class", "timetable", "time", "room"],
                "Viewing your class schedule\n\
                 1. Log in and open the Schedule tab.\n\
                 2. The page lists the day, time and room of every class this semester.\n\
                 Save a screenshot early in the semester for offline reference.",
            ),
            procedure(
                "Registration Form",
                &[
                    "registration form",
                    "download registration",
                    "get registration form",
                    "cor",
                    "print form",
                    "enrollment form",
                ],
                "Downloading your Registration Form (COR)\n\
                 1. Log in and open the Account tab.\n\
                 2. Select Registration Form, next to Statement of Account.\n\
                 3. Use the viewer's download icon to save a PDF or the print icon to print it.",
            ),
            procedure(
                "Account History",
                &[
                    "statement of account",
                    "soa",
                    "payment history",
                    "account history",
                    "check balance",
                    "view balance",
                    "fees paid",
                    "payment records",
                ],
                "Checking your payment history\n\
                 1. Log in and open the Account tab.\n\
                 2. Under Assessment Fees, choose a semester for its breakdown.\n\
                 3. Use the Statement of Account link to download an official copy.\n\
                 Assessment is the amount billed, Payment is what you paid, Balance is what remains.",
            ),
            procedure(
                "Password",
                &["password", "change password", "update password", "reset password", "account security"],
                "Changing your password\n\
                 1. Log in and open the Password tab.\n\
                 2. Enter your current password, then the new one twice.\n\
                 3. Click Change Password.\n\
                 New passwords must meet the portal rules (uppercase letters, numbers, symbols).",
            ),
        ],
        DEFAULT_HELP,
    )
}
