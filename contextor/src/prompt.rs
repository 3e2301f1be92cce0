//! Prompt builders for the initial answer and each refinement step.

use rag_store::RankedPassage;

/// System instruction sent with every generation call.
pub const DEFAULT_SYSTEM: &str = r#"
You are an assistant who knows the team's Scrapbox knowledge base well.
Use only the provided context as ground truth. Reply in the language of the question.
"#;

/// Heading under which the running answer is shown to the model.
pub const EXISTING_ANSWER_HEADING: &str = "# Existing answer";

/// Renders passages as labeled blocks, in the given order.
pub fn render_passages(passages: &[RankedPassage]) -> String {
    passages
        .iter()
        .map(|p| format!("## {}\nURL: {}\n{}", p.title, p.url, p.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First call: answer from the first group only.
pub fn build_initial_prompt(query: &str, passages: &[RankedPassage]) -> String {
    format!(
        "Answer the user's question using only the context below.\n\
         At the end of the answer, list the title and URL of every page you used.\n\
         \n\
         # Context\n\
         {ctx}\n\
         \n\
         # Question\n\
         {query}\n",
        ctx = render_passages(passages),
        query = query.trim(),
    )
}

/// Later calls: update `existing` with the next group.
pub fn build_refine_prompt(query: &str, existing: &str, passages: &[RankedPassage]) -> String {
    format!(
        "Update and improve the existing answer using the additional context below.\n\
         Add information where it helps. If the additional context conflicts with the\n\
         existing answer, prefer the additional context.\n\
         At the end of the answer, list the title and URL of every page used so far.\n\
         \n\
         # Question\n\
         {query}\n\
         \n\
         {EXISTING_ANSWER_HEADING}\n\
         {existing}\n\
         \n\
         # Additional context\n\
         {ctx}\n",
        query = query.trim(),
        existing = existing.trim(),
        ctx = render_passages(passages),
    )
}
