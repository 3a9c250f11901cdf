//! Fixed prompt template for cold-email drafts.

use crate::DraftRequest;

const INSTRUCTIONS: &str = "\
Keep the email concise, professional and actionable. \
Make it specific to the recipient and their company rather than generic. \
Use the correct company name and write it in bold with HTML tags each time it appears. \
Structure the body as HTML paragraphs (<p>), with a list (<ul><li>) only where it helps. \
Do not include links or references. \
End by asking whether the recipient is open to a short call.";

/// Render the prompt for `request`.
///
/// The model is asked to answer with a JSON object holding exactly the keys
/// `subject` and `body`.
pub fn build_prompt(request: &DraftRequest) -> String {
    format!(
        "You are an expert B2B sales email writer. Write one personalized cold email \
         addressed to '{person}'.\n\n\
         Company/Person Context: {company}\n\n\
         {instructions}\n\n\
         Respond with a JSON object with keys \"subject\" and \"body\" only.",
        person = request.person_name,
        company = request.company_info,
        instructions = INSTRUCTIONS,
    )
}
