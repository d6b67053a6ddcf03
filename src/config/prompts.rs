//! Advisor persona and prompt text
//!
//! The advisor's system prompt is built in, and can be replaced by a persona file.
//!
//! # Example Persona File
//!
//! ```toml
//! [persona]
//! name = "Skincare Advisor"
//! description = "Helps customers build skincare routines"
//!
//! [system_prompt]
//! content = """
//! You are a skincare advisor...
//! """
//!
//! [examples]
//! questions = ["What goes on first, serum or moisturizer?"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::catalog::Product;

/// A persona/prompt template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Persona metadata
    pub persona: PersonaInfo,

    /// The system prompt
    pub system_prompt: SystemPrompt,

    /// Example questions this persona handles well
    #[serde(default)]
    pub examples: PromptExamples,
}

/// Persona metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaInfo {
    /// Display name of the persona
    pub name: String,

    /// Brief description
    #[serde(default)]
    pub description: String,
}

/// System prompt content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPrompt {
    pub content: String,
}

/// Example questions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptExamples {
    #[serde(default)]
    pub questions: Vec<String>,
}

impl PromptTemplate {
    /// The built-in beauty advisor
    pub fn builtin() -> Self {
        Self {
            persona: PersonaInfo {
                name: "Beauty Advisor".to_string(),
                description: "Builds personalized skincare and beauty routines".to_string(),
            },
            system_prompt: SystemPrompt {
                content: builtin::ADVISOR.to_string(),
            },
            examples: PromptExamples::default(),
        }
    }

    /// Load a template from a TOML file
    pub async fn load_from_file(path: &Path) -> Result<PromptTemplate, PromptError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<PromptTemplate, PromptError> {
        let template: PromptTemplate =
            toml::from_str(content).map_err(|e| PromptError::ParseError(e.to_string()))?;

        if template.system_prompt.content.trim().is_empty() {
            return Err(PromptError::ParseError(
                "system_prompt.content is empty".to_string(),
            ));
        }
        Ok(template)
    }
}

/// Errors from prompt loading
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Request text for the "generate routine" action
pub fn routine_prompt(products: &[Product]) -> String {
    let listing = products
        .iter()
        .map(|p| format!("• {}", p.summary()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Create a concise but complete beauty routine using these products:\n\n\
        {}\n\n\
        Provide a structured routine with:\n\
        1. Morning steps (if applicable)\n\
        2. Evening steps (if applicable)\n\
        3. Application order and basic usage tips\n\
        4. Frequency (daily/weekly)\n\n\
        Keep it detailed but concise. End with \"Routine complete!\" so I know it's finished.",
        listing
    )
}

/// Built-in prompts that don't require files
pub mod builtin {
    /// Beauty advisor prompt
    pub const ADVISOR: &str = r#"You are a L'Oréal beauty advisor helping customers build personalized skincare and beauty routines. You specialize in products from L'Oréal brands including CeraVe, La Roche-Posay, Vichy, L'Oréal Paris, Maybelline, Lancôme, Garnier, Kiehl's, Kérastase, SkinCeuticals, Urban Decay, Yves Saint Laurent, and Redken.

You should only discuss topics related to:
- Skincare routines and products
- Haircare and styling
- Makeup application and techniques
- Fragrance recommendations
- Beauty tips and advice
- Product ingredients and benefits
- Routine modifications and improvements

If asked about unrelated topics, politely redirect the conversation back to beauty and skincare.

Provide helpful, friendly advice. Keep responses concise but informative."#;
}
