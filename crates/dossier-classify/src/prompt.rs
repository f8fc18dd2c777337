//! The instruction sent with every document.

/// Build the prompt for a set of candidate department names.
///
/// The names are embedded as a JSON array so that names containing commas
/// or quotes survive intact.
pub fn build_prompt(labels: &[String]) -> String {
  let roster = serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_owned());
  format!(
    "You are an assistant that routes incoming documents to the correct \
     department within an organisation. Read the attached document, extract \
     its text and understand its meaning.\n\
     \n\
     The departments are: {roster}\n\
     \n\
     Based strictly on the document's content, pick the top 3 most relevant \
     departments from that list and give each a probability. If fewer than 3 \
     are clearly relevant, return only those. Use the department names \
     exactly as listed.\n\
     \n\
     Reply with JSON only, in this shape:\n\
     [{{\"department\": \"<name>\", \"probability\": <0..1>}}]"
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prompt_lists_every_label_as_json() {
    let labels = vec!["Legal Services".to_owned(), "Head, \"ICT\" Unit".to_owned()];
    let prompt = build_prompt(&labels);
    assert!(prompt.contains(r#"["Legal Services","Head, \"ICT\" Unit"]"#));
    assert!(prompt.contains("\"department\""));
  }

  #[test]
  fn empty_roster_is_an_empty_array() {
    assert!(build_prompt(&[]).contains("The departments are: []"));
  }
}
