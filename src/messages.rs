//! User-facing text for failures and state titles.
//!
//! Two catalogues ship: English (default) and Persian. Every [`ErrorKind`]
//! and every [`WorkflowState`] has an entry in both.

use crate::error::PipelineError;
use crate::state::WorkflowState;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fa,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "fa" | "persian" | "farsi" => Ok(Locale::Fa),
            other => Err(format!("unsupported locale '{other}' (expected en or fa)")),
        }
    }
}

/// The message shown in the failed state for `error`.
pub fn failure_message(locale: Locale, error: &PipelineError) -> String {
    match (locale, error) {
        (Locale::En, PipelineError::Load { name, .. }) => format!(
            "Could not read \"{name}\". Make sure it is a valid, unencrypted PDF file."
        ),
        (Locale::Fa, PipelineError::Load { name, .. }) => format!(
            "خطا در خواندن فایل «{name}». لطفاً از معتبر بودن فایل PDF اطمینان حاصل کنید."
        ),

        (Locale::En, PipelineError::Auth { .. }) => {
            "The provided API key is not valid. Please check the application configuration."
                .to_string()
        }
        (Locale::Fa, PipelineError::Auth { .. }) => {
            "کلید API ارائه شده نامعتبر است. لطفاً پیکربندی برنامه را بررسی کنید.".to_string()
        }

        (Locale::En, PipelineError::Network { .. }) => {
            "The AI service could not be reached. Check your network connection and try again."
                .to_string()
        }
        (Locale::Fa, PipelineError::Network { .. }) => {
            "ارتباط با سرویس هوش مصنوعی برقرار نشد. اتصال شبکه را بررسی کرده و دوباره تلاش کنید."
                .to_string()
        }

        (Locale::En, PipelineError::MalformedResponse { .. }) => {
            "The AI could not extract a valid table. Please check the contents of the PDF."
                .to_string()
        }
        (Locale::Fa, PipelineError::MalformedResponse { .. }) => {
            "هوش مصنوعی نتوانست جدول معتبری استخراج کند. لطفاً محتوای PDF را بررسی کنید."
                .to_string()
        }

        (
            Locale::En,
            PipelineError::MalformedTable {
                row,
                expected,
                found,
            },
        ) => format!(
            "The extracted table is inconsistent: row {row} has {found} columns instead of {expected}."
        ),
        (
            Locale::Fa,
            PipelineError::MalformedTable {
                row,
                expected,
                found,
            },
        ) => format!(
            "جدول استخراج‌شده ناهمخوان است: ردیف {row} دارای {found} ستون به جای {expected} ستون است."
        ),

        (Locale::En, PipelineError::Unknown { .. }) => {
            "An unknown error occurred during conversion.".to_string()
        }
        (Locale::Fa, PipelineError::Unknown { .. }) => {
            "یک خطای ناشناخته در هنگام تبدیل رخ داد.".to_string()
        }
    }
}

/// Short heading for the state, as a status panel would show it.
pub fn state_title(locale: Locale, state: &WorkflowState) -> &'static str {
    match (locale, state) {
        (Locale::En, WorkflowState::Idle) => "Select PDF files",
        (Locale::Fa, WorkflowState::Idle) => "فایل‌های PDF را انتخاب کنید",
        (Locale::En, WorkflowState::Merging) => "Merging files…",
        (Locale::Fa, WorkflowState::Merging) => "در حال ادغام فایل‌ها...",
        (Locale::En, WorkflowState::MergeSucceeded { .. }) => "Files merged successfully!",
        (Locale::Fa, WorkflowState::MergeSucceeded { .. }) => "فایل‌ها با موفقیت ادغام شدند!",
        (Locale::En, WorkflowState::PostMerge { .. }) => "Convert the merged file to Excel?",
        (Locale::Fa, WorkflowState::PostMerge { .. }) => "فایل ادغام‌شده به اکسل تبدیل شود؟",
        (Locale::En, WorkflowState::Processing) => "Processing…",
        (Locale::Fa, WorkflowState::Processing) => "در حال پردازش...",
        (Locale::En, WorkflowState::ConversionSucceeded { .. }) => {
            "Conversion completed successfully!"
        }
        (Locale::Fa, WorkflowState::ConversionSucceeded { .. }) => "تبدیل با موفقیت انجام شد!",
        (Locale::En, WorkflowState::Failed { .. }) => "Processing error",
        (Locale::Fa, WorkflowState::Failed { .. }) => "خطا در پردازش",
    }
}
