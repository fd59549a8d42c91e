//! Prompts for LLM-based table extraction.
//!
//! Callers can override the system prompt via
//! [`crate::config::WorkflowConfig::system_prompt`]; the JSON contract in
//! [`TABLE_SCHEMA`] is always appended to the user message so an override
//! cannot drop it.

/// Default system prompt for turning extracted PDF text into one table.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert data extraction tool. You receive text that was extracted from a PDF document, page by page. Identify the primary table or structured data in this text and convert it into a single JSON object.

Follow these rules precisely:

1. SHAPE
   - 'headers' is an array of strings: the column titles, in order
   - 'rows' is an array of arrays; each inner array is one row of cell values as strings
   - Every row MUST have exactly as many elements as 'headers'

2. CHOOSING THE TABLE
   - If there are several tables, use the most prominent and complete one
   - A table continued across pages is one table; do not repeat its header row as data
   - If the text contains no obvious table, structure the information logically into headers and rows

3. FIDELITY
   - Do not invent data. Use only values present in the text
   - Keep numbers, dates and codes exactly as written
   - Use an empty string for a cell that is blank in the document

4. OUTPUT FORMAT
   - Output ONLY the JSON object
   - Do NOT wrap it in ```json fences
   - Do NOT add commentary or explanations"#;

/// The response contract, stated as JSON Schema.
pub const TABLE_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "headers": { "type": "array", "items": { "type": "string" } },
    "rows": { "type": "array", "items": { "type": "array", "items": { "type": "string" } } }
  },
  "required": ["headers", "rows"],
  "additionalProperties": false
}"#;

/// Build the user message carrying the document text.
pub fn table_request(pdf_text: &str) -> String {
    format!(
        "Respond with JSON matching this schema:\n{}\n\nHere is the text from the PDF:\n---\n{}\n---",
        TABLE_SCHEMA, pdf_text
    )
}
