//! Prompt construction for the debate phases.

use parley_core::{AgentClarifications, Round};

pub fn agent_system(name: &str, role: &str) -> String {
    format!(
        "You are {name}, a debate participant arguing from the perspective of a {role}. \
         Be rigorous and concrete. Ground every claim in the problem at hand."
    )
}

pub fn propose(problem: &str, context: &str) -> String {
    format!(
        "Propose a solution to the following problem.\n\n{context}\n\n\
         Problem: {problem}\n\n\
         Give a complete, self-contained proposal. State your key assumptions."
    )
}

pub fn critique(proposal: &str, context: &str) -> String {
    format!(
        "{context}\n\nCritique the following proposal from another participant. \
         Identify concrete weaknesses, risks, and missed constraints. \
         Do not propose your own solution.\n\nProposal:\n{proposal}"
    )
}

pub fn refine(original: &str, critiques: &[String], context: &str) -> String {
    let critiques = if critiques.is_empty() {
        "(no critiques were raised)".to_string()
    } else {
        critiques
            .iter()
            .enumerate()
            .map(|(i, c)| format!("Critique {}:\n{c}", i + 1))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    format!(
        "{context}\n\nRevise your proposal below in light of the critiques. \
         Keep what survived scrutiny, fix what did not, and say what changed.\n\n\
         Your proposal:\n{original}\n\n{critiques}"
    )
}

pub fn clarify(problem: &str, context: &str, prior: Option<&[AgentClarifications]>) -> String {
    let mut prompt = format!(
        "{context}\n\nProblem: {problem}\n\n\
         Before debating, list the clarifying questions you need answered to argue well. \
         Respond with a JSON array of objects: [{{\"text\": \"...\"}}]. \
         Respond with [] if you have no questions."
    );
    if let Some(groups) = prior {
        let answered: Vec<String> = groups
            .iter()
            .flat_map(|g| &g.items)
            .filter(|i| i.is_answered())
            .map(|i| format!("Q: {}\nA: {}", i.question, i.answer))
            .collect();
        if !answered.is_empty() {
            prompt.push_str(&format!(
                "\n\nThese questions were already answered; only ask genuinely new follow-ups:\n{}",
                answered.join("\n")
            ));
        }
    }
    prompt
}

pub fn summarize_context(context: &str) -> String {
    format!(
        "Condense the following debate context into a brief that preserves every fact, \
         constraint, and position needed to keep debating. Drop repetition and filler.\n\n{context}"
    )
}

pub fn judge_system() -> String {
    "You are the judge of a structured multi-agent debate. You weigh the participants' \
     proposals, critiques, and refinements impartially and produce the final answer."
        .to_string()
}

pub fn synthesize(problem: &str, context: &str) -> String {
    format!(
        "{context}\n\nProblem: {problem}\n\n\
         Synthesize the single best solution from the debate above. Merge the strongest \
         elements, resolve the disagreements explicitly, and present one coherent answer."
    )
}

pub fn evaluate_confidence(transcript: &str) -> String {
    format!(
        "Below is the transcript of a debate in progress. Rate how converged the \
         participants' positions are on a scale of 0 to 100, where 100 means their latest \
         refinements agree in substance. Respond with only the number.\n\n{transcript}"
    )
}

/// Plain-text rendering of rounds for judge prompts.
pub fn transcript(rounds: &[Round]) -> String {
    let mut out = Vec::new();
    for round in rounds {
        for c in &round.contributions {
            out.push(format!(
                "[round {} / {}] {} ({}):\n{}",
                round.round_number,
                c.kind.as_str(),
                c.agent_id,
                c.agent_role,
                c.content
            ));
        }
    }
    out.join("\n\n")
}
