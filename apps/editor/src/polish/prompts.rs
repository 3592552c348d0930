use crate::polish::transform::{PolishMode, PolishRequest};

pub const POLISH_SYSTEM: &str = "You are a professional resume writer. \
    You rewrite resume text so it reads clearly and professionally. \
    Keep every fact from the original; never invent employers, dates, numbers or skills. \
    Reply with the rewritten text only: no preamble, no explanations, no code fences.";

fn instruction(mode: PolishMode) -> &'static str {
    match mode {
        PolishMode::Polish => {
            "Polish the following text. Use strong action verbs, tighten wording \
             and keep the length about the same."
        }
        PolishMode::Expand => {
            "Expand the following text with more detail about scope, responsibilities \
             and results, staying faithful to what it already says."
        }
        PolishMode::Simplify => {
            "Simplify the following text. Remove redundancy and keep only the most \
             important points."
        }
        PolishMode::Format => {
            "Reformat the following text as concise bullet points, one achievement per line, \
             each starting with \"- \"."
        }
    }
}

pub fn build_polish_prompt(request: &PolishRequest) -> String {
    let mut prompt = String::from(instruction(request.mode));
    if let Some(context) = request.context.as_deref().filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\n\nThis text is the resume field: {context}"));
    }
    prompt.push_str(&format!("\n\nTEXT:\n{}", request.content));
    prompt
}
