//! Compiled-in document templates.
//!
//! Item templates carry a `{{name}}` placeholder and lay out the metadata
//! lines and phase sections that [`crate::codec`] reads back.

use crate::error::Result;
use crate::types::ItemType;
use chrono::NaiveDate;
use std::path::Path;

pub const NAME_PLACEHOLDER: &str = "{{name}}";

pub trait TemplateProvider: Send + Sync {
    /// Raw template text for `item_type`, placeholder intact.
    fn template(&self, item_type: ItemType) -> Result<String>;
}

/// Template for `item_type` with the placeholder replaced by `name`.
pub fn render_item(
    provider: &dyn TemplateProvider,
    item_type: ItemType,
    name: &str,
) -> Result<String> {
    Ok(provider.template(item_type)?.replace(NAME_PLACEHOLDER, name))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplates;

impl TemplateProvider for EmbeddedTemplates {
    fn template(&self, item_type: ItemType) -> Result<String> {
        let text = match item_type {
            ItemType::Feature => FEATURE_TEMPLATE,
            ItemType::Bug => BUG_TEMPLATE,
            ItemType::Experiment => EXPERIMENT_TEMPLATE,
        };
        Ok(text.to_string())
    }
}

// ---------------------------------------------------------------------------
// Postmortem
// ---------------------------------------------------------------------------

pub fn postmortem(name: &str, completed_on: NaiveDate) -> String {
    format!(
        "# Postmortem: {name}

## Completion Date
{date}

## Summary
- [ ] What was accomplished?
- [ ] Key challenges faced?
- [ ] Lessons learned?

## Metrics
- Development time:
- Lines of code added/modified:
- Tests added:

## What Went Well
-

## What Could Be Improved
-

## Follow-up Items
- [ ] Documentation updates needed
- [ ] Technical debt created
- [ ] Future enhancements identified
",
        date = completed_on.format("%Y-%m-%d")
    )
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// The contributor guide printed by `pm instructions`, pointed at the
/// configured stores.
pub fn instructions(backlog_dir: &Path, completed_dir: &Path) -> String {
    INSTRUCTIONS
        .replace("{{backlog_dir}}", &backlog_dir.display().to_string())
        .replace("{{completed_dir}}", &completed_dir.display().to_string())
}

// ---------------------------------------------------------------------------
// Template text
// ---------------------------------------------------------------------------

const FEATURE_TEMPLATE: &str = r#"# Feature: {{name}}

## Status: PROPOSED

## Phase: discovery

## Progress: 0%

## Assigned To: human

## Overview

Describe the problem this feature solves and who it is for.

## Discovery Phase

- [ ] Define the problem and the users affected
- [ ] Review existing code and prior art
- [ ] Write acceptance criteria

## Planning Phase

- [ ] Write the technical design
- [ ] Break the work into tasks
- [ ] Identify risks and dependencies

## Execution Phase

- [ ] Implement the feature
- [ ] Add tests
- [ ] Update documentation

## Cleanup Phase

- [ ] Review and refactor
- [ ] Verify acceptance criteria
- [ ] Record lessons learned

## Notes
"#;

const BUG_TEMPLATE: &str = r#"# Bug: {{name}}

## Status: PROPOSED

## Phase: discovery

## Progress: 0%

## Assigned To: human

## Description

What happens, what should happen, and how to reproduce it.

## Discovery Phase

- [ ] Reproduce the bug
- [ ] Identify the root cause
- [ ] Assess impact and severity

## Planning Phase

- [ ] Design the fix
- [ ] Plan regression tests

## Execution Phase

- [ ] Write a failing test
- [ ] Implement the fix
- [ ] Verify the fix

## Cleanup Phase

- [ ] Check for similar bugs elsewhere
- [ ] Update documentation

## Notes
"#;

const EXPERIMENT_TEMPLATE: &str = r#"# Experiment: {{name}}

## Status: PROPOSED

## Phase: discovery

## Progress: 0%

## Assigned To: human

## Hypothesis

State what you expect to learn and how you will know.

## Discovery Phase

- [ ] State the hypothesis
- [ ] Define success metrics

## Planning Phase

- [ ] Design the experiment
- [ ] Decide the time box

## Execution Phase

- [ ] Run the experiment
- [ ] Collect results

## Cleanup Phase

- [ ] Analyze results
- [ ] Decide: adopt, iterate, or drop
- [ ] Remove experimental code if dropped

## Findings
"#;

const INSTRUCTIONS: &str = r#"# Project Management Instructions

Work is tracked as markdown documents, one directory per work item.

- Active items live in `{{backlog_dir}}/<type>-<name>/README.md`
- Archived items live in `{{completed_dir}}/<type>-<name>/` with a POSTMORTEM.md

## When to create a work item

Create one for any change that spans more than a single sitting: new
features (`pm new feature <name>`), bugs (`pm new bug <name>`) and
time-boxed experiments (`pm new experiment <name>`).

## Workflow

Every item moves through four phases. `pm phase advance <name>` moves it
forward once every task of the current phase is checked.

1. **Discovery**: understand the problem. Write down what you learn.
2. **Planning**: design the solution and break it into tasks.
3. **Execution**: build it, with tests.
4. **Cleanup**: review, document, and sign off.

Statuses run PROPOSED, IN_PROGRESS_DISCOVERY, IN_PROGRESS_PLANNING,
IN_PROGRESS_EXECUTION, IN_PROGRESS_CLEANUP, IN_PROGRESS_REVIEW, COMPLETED.

## Working with tasks

- `pm phase tasks <name>` lists the current phase's tasks with their ids
- `pm phase complete <name> <id>` checks one off and refreshes progress
- Tasks may also be edited by hand: `- [ ]` open, `- [x]` done

## Humans and agents

- Agents pick up items assigned to them and keep the document current
- Humans review at each phase boundary
- `pm assign <name> <who>` hands an item over

## Finishing

When the status reaches COMPLETED, run `pm archive <name>` and fill in the
generated postmortem.
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
