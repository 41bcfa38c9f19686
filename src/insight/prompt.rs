//! Prompt construction for the text-generation service.

use super::section::SectionKind;

/// Build the instruction for one standard section: candidate identity,
/// campaign context, and the projected vote/rejection records.
pub fn section_prompt(
    kind: SectionKind,
    candidate_name: &str,
    context_note: &str,
    votes_json: &str,
    rejections_json: &str,
) -> String {
    let (min_words, max_words) = kind.word_range();
    format!(
        "You are a campaign strategy analyst. Write the \"{title}\" section of a \
strategic report for candidate {candidate_name}.\n\n\
Campaign context provided by the candidate:\n{context_note}\n\n\
Voter records collected for this candidate (JSON):\n{votes_json}\n\n\
Rejection records collected in this election (JSON):\n{rejections_json}\n\n\
Analyse the patterns in these records and produce a strategic narrative of \
{min_words} to {max_words} words. Ground every claim in the data above and end \
with concrete recommendations for the campaign.",
        title = kind.title(),
    )
}

/// Build the summarization instruction for the consolidated report.
pub fn consolidation_prompt(candidate_name: &str, context_note: &str, sections: &str) -> String {
    let (min_words, max_words) = SectionKind::Consolidated.word_range();
    format!(
        "You are a campaign strategy analyst. The following insight sections were \
previously generated for candidate {candidate_name}.\n\n\
Campaign context provided by the candidate:\n{context_note}\n\n\
{sections}\n\n\
Synthesise these into a single \"{title}\" narrative of {min_words} to \
{max_words} words: the overall strategic picture, the tensions between \
sections, and a prioritised plan of action.",
        title = SectionKind::Consolidated.title(),
    )
}

/// Build the victory-probability instruction from raw counts and the
/// serialized insight map.
pub fn victory_prompt(
    candidate_name: &str,
    context_note: &str,
    candidate_votes: u64,
    total_votes: u64,
    total_rejections: u64,
    insights_json: &str,
) -> String {
    let (min_words, max_words) = SectionKind::VictoryProbability.word_range();
    format!(
        "You are a campaign strategy analyst assessing candidate {candidate_name}.\n\n\
Campaign context provided by the candidate:\n{context_note}\n\n\
Raw standing: {candidate_votes} votes for this candidate, {total_votes} votes \
cast in the election overall, {total_rejections} rejections recorded.\n\n\
Previously generated insights (JSON):\n{insights_json}\n\n\
Estimate the candidate's probability of victory as a percentage, justify the \
estimate from the numbers and insights above, and produce recommendations, in \
{min_words} to {max_words} words under the title \"{title}\".",
        title = SectionKind::VictoryProbability.title(),
    )
}
