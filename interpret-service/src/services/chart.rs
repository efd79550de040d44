//! Rendering chart data into the prompt sent to the model.

use serde_json::Value;

/// Separator between the instruction template and the chart block.
pub const CHART_SECTION_HEADER: &str = "\n\nChart Data:\n";

/// Pretty-print chart JSON with two-space indentation.
pub fn serialize_chart(chart: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(chart)
}

/// Template, separator and serialized chart, in that order.
pub fn compose_prompt(template: &str, chart: &Value) -> Result<String, serde_json::Error> {
    let chart_json = serialize_chart(chart)?;

    let mut prompt =
        String::with_capacity(template.len() + CHART_SECTION_HEADER.len() + chart_json.len());
    prompt.push_str(template);
    prompt.push_str(CHART_SECTION_HEADER);
    prompt.push_str(&chart_json);
    Ok(prompt)
}
