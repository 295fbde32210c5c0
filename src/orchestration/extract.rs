//! Step trace and transcript extraction.

use crate::backend::{RunStep, StepDetail, ThreadMessage};
use crate::observability::Logger;

use super::result::{
    AdvertisedTool, StepTrace, ToolCallSummary, ToolParameter, TranscriptEntry, TranscriptRole,
};

/// Summarize run steps in creation order, logging each one.
pub fn step_trace(steps: &[RunStep], logger: &Logger) -> Vec<StepTrace> {
    let mut ordered: Vec<&RunStep> = steps.iter().collect();
    ordered.sort_by_key(|s| s.created_at);

    ordered
        .into_iter()
        .map(|step| {
            logger.log(&format!("Step {} status: {}", step.id, step.status));
            let trace = trace_step(step);
            log_trace(&trace, logger);
            logger.log("");
            trace
        })
        .collect()
}

fn trace_step(step: &RunStep) -> StepTrace {
    let mut trace = StepTrace {
        id: step.id.clone(),
        status: step.status.clone(),
        tool_calls: Vec::new(),
        advertised_tools: Vec::new(),
    };

    match &step.step_details {
        StepDetail::ToolCalls { tool_calls } => {
            trace.tool_calls = tool_calls
                .iter()
                .map(|call| ToolCallSummary {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    kind: call.kind.clone(),
                })
                .collect();
        }
        StepDetail::Activities { activities } => {
            trace.advertised_tools = activities
                .iter()
                .flat_map(|activity| activity.tools.iter())
                .map(|(name, definition)| AdvertisedTool {
                    name: name.clone(),
                    description: definition.description.clone(),
                    parameters: definition
                        .parameters
                        .iter()
                        .flat_map(|schema| schema.properties.iter())
                        .map(|(arg, property)| ToolParameter {
                            name: arg.clone(),
                            kind: property.kind.clone(),
                            description: property.description.clone(),
                        })
                        .collect(),
                })
                .collect();
        }
        StepDetail::Other => {}
    }

    trace
}

fn log_trace(trace: &StepTrace, logger: &Logger) {
    if !trace.tool_calls.is_empty() {
        logger.log("  MCP Tool calls:");
        for call in &trace.tool_calls {
            logger.log(&format!("    Tool Call ID: {}", call.id));
            logger.log(&format!("    Name: {}", call.name.as_deref().unwrap_or("-")));
            logger.log(&format!("    Type: {}", call.kind.as_deref().unwrap_or("-")));
        }
    }

    for tool in &trace.advertised_tools {
        logger.log(&format!(
            "  The function {} with description \"{}\" will be called.",
            tool.name,
            tool.description.as_deref().unwrap_or("")
        ));
        if tool.parameters.is_empty() {
            logger.log("  This function has no parameters");
            continue;
        }
        logger.log("  Function parameters:");
        for param in &tool.parameters {
            logger.log(&format!("      {}", param.name));
            logger.log(&format!("      Type: {}", param.kind.as_deref().unwrap_or("-")));
            logger.log(&format!(
                "      Description: {}",
                param.description.as_deref().unwrap_or("")
            ));
        }
    }
}

/// Build the transcript from a thread's messages.
///
/// Messages are taken oldest first; each one with text contributes its
/// latest text segment. Messages without text are skipped.
pub fn transcript(messages: &[ThreadMessage], logger: &Logger) -> Vec<TranscriptEntry> {
    let mut ordered: Vec<&ThreadMessage> = messages.iter().collect();
    ordered.sort_by_key(|m| m.created_at);

    let entries: Vec<TranscriptEntry> = ordered
        .into_iter()
        .filter_map(|message| {
            message
                .last_text()
                .map(|text| TranscriptEntry::new(TranscriptRole::from(message.role), text))
        })
        .collect();

    logger.log("Conversation:");
    logger.log(&"-".repeat(50));
    logger.log(&format!(
        "response: {}",
        serde_json::to_string(&entries).unwrap_or_default()
    ));

    entries
}
