//! Prompt assembly for the resume builder and cleanup of the model's HTML.

use std::fmt::Write as _;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{EducationEntry, ExperienceEntry, ResumeForm, SkillEntry};
use crate::services::inference::InferenceBackend;

const RESUME_INSTRUCTION: &str = "\
Create a professional resume in clean, well-structured HTML for the person described below.
Use semantic tags (h1, h2, h3, p, ul, li) and inline CSS only. Do not invent details that are not listed.
Return only the HTML document, without explanations or markdown.";

/// Introductions the model tends to put in front of the HTML.
const KNOWN_PREAMBLES: &[&str] = &[
    "here is the html code for the resume:",
    "here is the html code for your resume:",
    "here is the resume in html format:",
    "here is your resume in html format:",
    "here is the html for the resume:",
    "here's the html code for the resume:",
    "here's the html for the resume:",
    "here's your resume in html:",
    "here is your resume:",
    "here's your resume:",
    "sure! here is the html:",
    "sure, here is the html:",
    "html:",
];

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn education_block(out: &mut String, entry: &EducationEntry) {
    let _ = writeln!(out, "- Degree: {}", escape_html(&entry.degree));
    let _ = writeln!(out, "  Institution: {}", escape_html(&entry.institution));
    let _ = writeln!(out, "  Year: {}", escape_html(&entry.year));
    let _ = writeln!(out, "  Details: {}", escape_html(&entry.details));
}

fn experience_block(out: &mut String, entry: &ExperienceEntry) {
    let _ = writeln!(out, "- Position: {}", escape_html(&entry.title));
    let _ = writeln!(out, "  Company: {}", escape_html(&entry.company));
    let _ = writeln!(out, "  Duration: {}", escape_html(&entry.duration));
    let _ = writeln!(out, "  Description: {}", escape_html(&entry.description));
}

fn skill_block(out: &mut String, entry: &SkillEntry) {
    let _ = writeln!(
        out,
        "- {}: {}",
        escape_html(&entry.category),
        escape_html(&entry.skills)
    );
}

fn section<T>(out: &mut String, title: &str, entries: &[T], block: fn(&mut String, &T)) {
    let _ = writeln!(out, "\n{}:", title);
    if entries.is_empty() {
        out.push_str("None provided\n");
    }
    for entry in entries {
        block(out, entry);
    }
}

/// Fills the resume template. Each entry list renders one block per entry in
/// submission order.
pub fn build_resume_prompt(form: &ResumeForm) -> String {
    let mut prompt = String::from(RESUME_INSTRUCTION);
    prompt.push_str("\n\nPersonal Information:\n");
    let _ = writeln!(prompt, "Name: {}", escape_html(&form.full_name));
    let _ = writeln!(prompt, "Email: {}", escape_html(&form.email));
    let _ = writeln!(prompt, "Phone: {}", escape_html(&form.phone));
    let _ = writeln!(prompt, "Location: {}", escape_html(&form.location));
    let _ = write!(prompt, "\nProfessional Summary:\n{}\n", escape_html(&form.summary));

    section(&mut prompt, "Education", &form.education, education_block);
    section(&mut prompt, "Experience", &form.experience, experience_block);
    section(&mut prompt, "Skills", &form.skills, skill_block);

    prompt
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

/// Openers of a free-form introduction line ("Here is a professional resume for ...:").
const PREAMBLE_OPENERS: &[&str] = &["here is", "here's", "here are", "sure", "certainly"];

/// Drops a chatty introduction up to the first `<`.
fn strip_preamble_sentence(text: &str) -> Option<&str> {
    if text.starts_with('<') {
        return None;
    }
    PREAMBLE_OPENERS
        .iter()
        .find(|opener| strip_prefix_ignore_case(text, opener).is_some())?;
    text.find('<').map(|start| &text[start..])
}

fn strip_opening_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // Drop the language tag, if any, up to the end of the fence line.
    Some(match rest.find('\n') {
        Some(newline) if !rest[..newline].contains('<') => &rest[newline + 1..],
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    })
}

/// Removes code fences, known preambles and anything after the closing
/// `</html>` tag.
pub fn clean_generated_html(raw: &str) -> String {
    let mut text = raw.trim();

    loop {
        let before = text;
        if let Some(rest) = strip_opening_fence(text) {
            text = rest.trim();
        }
        if let Some(rest) = text.strip_suffix("```") {
            text = rest.trim();
        }
        for preamble in KNOWN_PREAMBLES {
            if let Some(rest) = strip_prefix_ignore_case(text, preamble) {
                text = rest.trim();
                break;
            }
        }
        if let Some(rest) = strip_preamble_sentence(text) {
            text = rest;
        }
        if text == before {
            break;
        }
    }

    let lower = text.to_ascii_lowercase();
    if let Some(end) = lower.rfind("</html>") {
        text = &text[..end + "</html>".len()];
    }

    text.trim().to_string()
}

/// Asks the model for the resume HTML and returns it cleaned.
pub async fn generate_resume_html(
    backend: &dyn InferenceBackend,
    form: &ResumeForm,
) -> AppResult<String> {
    let prompt = build_resume_prompt(form);
    info!(
        model = backend.model(),
        education = form.education.len(),
        experience = form.experience.len(),
        skills = form.skills.len(),
        "Requesting resume generation"
    );

    let raw = backend.generate(&prompt).await?;
    let html = clean_generated_html(&raw);
    if html.is_empty() {
        return Err(AppError::Inference {
            message: "model returned no HTML after cleanup".to_string(),
        });
    }
    Ok(html)
}
