/**
 * COMMAND DISPATCHER - Operator command forms
 *
 * ROLE:
 * Builds one form per command of the service catalogue, keeps the operator's
 * input between submissions, serializes it the way the invoke endpoint expects
 * and records the outcome in the form's error slot.
 *
 * WIRE FORMAT:
 * cmd=<id>&0=<value>&1=<value>&2=<v1>&2=<v2>...
 * Inputs are named after their parameter index; a vargs parameter repeats its name.
 */

use crate::client::ConsoleClient;
use crate::error::{ConsoleError, Result};
use crate::models::{CommandDescriptor, InvokeResponse};
use crate::state::ConsoleState;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub id: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormParam {
    pub index: usize,
    pub label: String,
    pub vargs: bool,
    pub fields: Vec<InputField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Carries the server's message, if it sent one
    Succeeded(Option<String>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandForm {
    pub command: CommandDescriptor,
    pub params: Vec<FormParam>,
    /// Error slot shown under the form
    pub error: Option<String>,
    /// Confirmation of the last successful submission
    pub confirmation: Option<String>,
}

impl CommandForm {
    pub fn new(command: CommandDescriptor) -> Self {
        let params = command
            .parameters
            .iter()
            .enumerate()
            .map(|(index, p)| FormParam {
                index,
                label: p.name.clone(),
                vargs: p.vargs,
                fields: vec![InputField {
                    id: format!("{}_{}", command.id, index),
                    name: index.to_string(),
                    value: String::new(),
                }],
            })
            .collect();
        Self { command, params, error: None, confirmation: None }
    }

    pub fn id(&self) -> &str {
        &self.command.id
    }

    pub fn title(&self) -> &str {
        &self.command.title
    }

    /// "Add": appends an input to a vargs parameter. Returns the new field id.
    pub fn add_field(&mut self, index: usize) -> Option<String> {
        let cmd_id = self.command.id.clone();
        let param = self.params.get_mut(index).filter(|p| p.vargs)?;
        let id = format!("{}_{}_{}", cmd_id, index, param.fields.len());
        param.fields.push(InputField { id: id.clone(), name: index.to_string(), value: String::new() });
        Some(id)
    }

    /// "Remove": drops the last input of a vargs parameter, never the only one.
    pub fn remove_field(&mut self, index: usize) -> bool {
        match self.params.get_mut(index) {
            Some(param) if param.vargs && param.fields.len() > 1 => {
                param.fields.pop();
                true
            }
            _ => false,
        }
    }

    pub fn set_value(&mut self, field_id: &str, value: impl Into<String>) -> bool {
        let field = self
            .params
            .iter_mut()
            .flat_map(|p| p.fields.iter_mut())
            .find(|f| f.id == field_id);
        match field {
            Some(f) => {
                f.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Fills inputs in parameter order. Surplus values go to a trailing vargs
    /// parameter, which grows as if "Add" had been clicked; without one they are
    /// rejected and the form is left untouched.
    pub fn fill<S: AsRef<str>>(&mut self, values: &[S]) -> Result<()> {
        let trailing_vargs = self.params.last().is_some_and(|p| p.vargs);
        if !trailing_vargs && values.len() > self.params.len() {
            return Err(ConsoleError::TooManyValues {
                command: self.command.id.clone(),
                expected: self.params.len(),
                given: values.len(),
            });
        }

        let mut values = values.iter().map(|v| v.as_ref().to_string());
        let last = self.params.len().saturating_sub(1);
        for index in 0..self.params.len() {
            let greedy = index == last && self.params[index].vargs;
            let Some(first) = values.next() else { break };
            self.params[index].fields[0].value = first;
            if greedy {
                for value in values.by_ref() {
                    if let Some(id) = self.add_field(index) {
                        self.set_value(&id, value);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn field_ids(&self) -> Vec<&str> {
        self.params.iter().flat_map(|p| p.fields.iter().map(|f| f.id.as_str())).collect()
    }

    /// Form-encoded pairs: hidden `cmd` first, then every input in order.
    pub fn serialize(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("cmd".to_string(), self.command.id.clone())];
        for param in &self.params {
            for field in &param.fields {
                pairs.push((field.name.clone(), field.value.clone()));
            }
        }
        pairs
    }

    /// Hides the error slot before a new submission.
    pub fn begin_submit(&mut self) {
        self.error = None;
        self.confirmation = None;
    }

    /// Fills the error slot on failure; inputs are left as they are.
    pub fn apply_response(&mut self, response: InvokeResponse) -> SubmitOutcome {
        if response.successful {
            self.confirmation = Some(response.message.clone().unwrap_or_else(|| "ok".to_string()));
            SubmitOutcome::Succeeded(response.message)
        } else {
            let message = response.message.unwrap_or_else(|| "command failed".to_string());
            self.error = Some(message.clone());
            SubmitOutcome::Failed(message)
        }
    }
}

/// Posts the form to the invoke endpoint and records the outcome on it.
pub async fn submit(client: &ConsoleClient, form: &mut CommandForm) -> Result<SubmitOutcome> {
    form.begin_submit();
    let pairs = form.serialize();
    debug!("invoking command {} with {} fields", form.id(), pairs.len() - 1);
    let response = client.invoke(&pairs).await?;
    let outcome = form.apply_response(response);
    match &outcome {
        SubmitOutcome::Succeeded(_) => info!("command {} succeeded", form.id()),
        SubmitOutcome::Failed(msg) => warn!("command {} failed: {}", form.id(), msg),
    }
    Ok(outcome)
}

impl ConsoleState {
    /// Creates forms for commands not seen before; existing forms keep their input.
    pub fn sync_commands(&mut self, catalogue: Vec<CommandDescriptor>) -> Vec<String> {
        let mut created = Vec::new();
        for command in catalogue {
            if self.forms.contains_key(&command.id) {
                continue;
            }
            let id = command.id.clone();
            self.forms.insert(id.clone(), CommandForm::new(command));
            self.form_order.push(id.clone());
            created.push(id);
        }
        created
    }

    pub fn form_mut(&mut self, command_id: &str) -> Result<&mut CommandForm> {
        self.forms
            .get_mut(command_id)
            .ok_or_else(|| ConsoleError::UnknownCommand(command_id.to_string()))
    }
}
