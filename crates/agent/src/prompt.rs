//! System prompt assembly.
//!
//! The transcript is seeded with three system messages: the task
//! instructions (including the action vocabulary), the knowledge base, and
//! the output-format constraint.

use crate::directive::DIRECTIVE_PREFIX;
use sentinel_core::action::ActionKind;
use sentinel_core::message::Message;

const INSTRUCTIONS: &str = r#"You are an LLM agent helping users manage a project called arXiv Sentinel.
arXiv Sentinel is a serverless function deployed on Vercel. It regularly downloads papers on a chosen arXiv topic, summarizes them with an LLM, and emails a report to the user.
Find out what the user wants, plan on your own, and help the user finish the task.

The usual deployment process:
    Step 01, prerequisites:
    The user needs a Vercel account.
    To send emails, the user needs an App password from Google.
    To use an LLM, the user needs an OpenAI API key.
    To download papers, the user needs to choose an arXiv topic.

    Step 02, collect information:
    Once the user has these, collect them from the user.

    Step 03, configure the Vercel environment variables:
    EMAIL_ADDRESS="send_from_email_address"
    EMAIL_PASSWORD="google_app_password"
    OPENAI_API_KEY="your_openai_api_key"
    PAPER_TOPIC="arXiv_topic"
    TARGET_ADDRESS="email_address_to_get_report"

    Step 04, test the Vercel function locally.

    Step 05, deploy the function to the cloud.

These steps are not fixed; adapt them to the task at hand."#;

const EXAMPLES: &str = r#"Example 01:
Action: OpenWebpage(url='arxiv.org')
Action: OutputInformation(info='I opened the arXiv website for you')
Action: GetUserInput(prompt='Please tell me the arXiv topic you like')

Example 02:
Action: ExecuteCLICommand(command='vercel env pull')
Action: ReadFile(file_path='.env.local')
Action: OutputInformation(info='Vercel env variables: {.env.local content}')"#;

/// Render the action vocabulary, one usage line per kind.
pub fn render_vocabulary(kinds: &[ActionKind]) -> String {
    kinds
        .iter()
        .map(|k| format!("- {}, {}", k.signature(), k.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The instruction message: task description, vocabulary and examples.
pub fn instructions(kinds: &[ActionKind]) -> String {
    format!(
        "{INSTRUCTIONS}\n\nYou can take actions in the following format:\n\n\
         {DIRECTIVE_PREFIX} ActionName(param1='value1', param2='value2')\n\n\
         Available Actions:\n{}\n\n{EXAMPLES}",
        render_vocabulary(kinds)
    )
}

/// The format constraint, repeated at the end of the seed.
pub fn constraint(quit_token: &str) -> String {
    format!(
        "Respond only with actions, one per line, each starting with '{DIRECTIVE_PREFIX}'. \
         Do not include any other text. Results of your actions come back as the next messages.\n\
         When the user's task is complete or the user wants to stop, reply with {quit_token} and nothing else."
    )
}

/// Sent after a reply that contained no actions and no quit token.
pub fn format_reminder(quit_token: &str) -> String {
    format!(
        "Your last reply contained no actions. Reply with one or more lines of the form \
         {DIRECTIVE_PREFIX} ActionName(param='value'), or with {quit_token} to end the session."
    )
}

/// Build the seed messages for a new transcript.
///
/// `instructions_override` replaces the built-in instructions; the
/// vocabulary is still appended so the model knows what it may call.
pub fn seed_messages(
    kinds: &[ActionKind],
    knowledge: &str,
    quit_token: &str,
    instructions_override: Option<&str>,
) -> Vec<Message> {
    let instructions = match instructions_override {
        Some(custom) => format!(
            "{custom}\n\nAvailable Actions:\n{}",
            render_vocabulary(kinds)
        ),
        None => instructions(kinds),
    };

    let mut seed = vec![Message::system(instructions)];
    if !knowledge.trim().is_empty() {
        seed.push(Message::system(format!("Knowledge base:\n{knowledge}")));
    }
    seed.push(Message::system(constraint(quit_token)));
    seed
}
