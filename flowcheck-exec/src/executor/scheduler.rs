use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flowcheck_core::{
    build_graph, validate_flow, DependencyGraph, Environment, FailurePolicy, Flow, VariableScope,
};
use flowcheck_store::{FlowRun, RunStatus, StepResult, StepState};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::executor::concurrency::ConcurrencyLimits;
use crate::executor::config::ExecutorConfig;
use crate::executor::error::ExecutionError;
use crate::executor::events::{Event, EventSink};
use crate::executor::http::HttpClient;
use crate::executor::worker::{StepOutcome, StepTask, Worker};

/// Per-run knobs chosen by the caller.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Falls back to the flow's own policy, then to abort.
    pub failure_policy: Option<FailurePolicy>,
    /// Let successors of an Errored step run instead of skipping them.
    pub continue_after_errors: bool,
    pub cancel: Option<CancellationToken>,
    /// Overrides `ExecutorConfig::run_deadline`.
    pub deadline: Option<Duration>,
}

pub struct Executor {
    config: ExecutorConfig,
    http: Arc<dyn HttpClient>,
    events: Arc<dyn EventSink>,
}

impl Executor {
    pub fn new(config: ExecutorConfig, http: Arc<dyn HttpClient>, events: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            http,
            events,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn http(&self) -> &Arc<dyn HttpClient> {
        &self.http
    }

    /// Runs every step of `flow` against `env` and returns the complete record.
    ///
    /// Configuration errors (cycles, dangling edges, malformed expressions)
    /// are returned before any request is sent.
    pub async fn execute(
        &self,
        flow: &Flow,
        env: &Environment,
        options: RunOptions,
    ) -> Result<FlowRun, ExecutionError> {
        validate_flow(flow)?;
        let graph = build_graph(flow)?;

        let policy = options
            .failure_policy
            .or(flow.failure_policy)
            .unwrap_or_default();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut scope =
            VariableScope::with_environment(self.config.generators(), env.variables.clone());

        let run_token = options
            .cancel
            .as_ref()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let deadline = options.deadline.or(self.config.run_deadline);

        let worker = Arc::new(Worker {
            http: self.http.clone(),
            events: self.events.clone(),
            limits: ConcurrencyLimits::new(self.config.max_concurrency),
        });

        self.events
            .emit(Event::RunStarted {
                run_id,
                flow_id: flow.flow_id.clone(),
            })
            .await;

        let mut tracker = Tracker::new(&graph, policy, options.continue_after_errors);
        let mut ready: VecDeque<String> = tracker.initially_ready().into();
        let mut tasks: JoinSet<StepOutcome> = JoinSet::new();
        let mut stop_reason: Option<&'static str> = None;

        let mut deadline_timer = std::pin::pin!(async move {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        });

        loop {
            if stop_reason.is_none() {
                while let Some(id) = ready.pop_front() {
                    let Some(step) = flow.step(&id) else {
                        continue;
                    };
                    let task = StepTask {
                        run_id,
                        step: step.clone(),
                        base_url: env.base_url.clone(),
                        scope: scope.clone(),
                        timeout: self.config.step_timeout(step.timeout_ms),
                        max_response_bytes: self.config.max_response_bytes,
                        cancel: run_token.clone(),
                    };
                    let w = worker.clone();
                    tasks.spawn(async move { w.run(task).await });
                }
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = run_token.cancelled(), if stop_reason.is_none() => {
                    stop_reason = Some("run cancelled");
                    tracing::warn!(%run_id, "run cancelled; stopping in-flight steps");
                }
                _ = &mut deadline_timer, if stop_reason.is_none() => {
                    stop_reason = Some("run deadline exceeded");
                    tracing::warn!(%run_id, "run deadline exceeded; stopping in-flight steps");
                    run_token.cancel();
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok(outcome)) => {
                        for (name, value) in &outcome.captured {
                            scope.capture(name.clone(), value.clone());
                        }
                        let result = outcome.result;
                        self.events
                            .emit(Event::StepFinished {
                                run_id,
                                step_id: result.step_id.clone(),
                                state: result.state,
                                duration_ms: result.response.as_ref().map(|r| r.duration_ms),
                            })
                            .await;
                        let settled = tracker.settle(result);
                        self.emit_skipped(run_id, &settled.skipped).await;
                        ready.extend(settled.ready);
                    }
                    Some(Err(e)) => {
                        run_token.cancel();
                        return Err(ExecutionError::TaskJoin(e.to_string()));
                    }
                    None => break,
                },
            }
        }

        let leftover = tracker.skip_remaining(stop_reason.unwrap_or("never became ready"));
        self.emit_skipped(run_id, &leftover).await;

        let results = tracker.into_results();
        let status = if stop_reason.is_some() {
            RunStatus::Cancelled
        } else if results.iter().all(|r| r.state == StepState::Passed) {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        };

        self.events
            .emit(Event::RunFinished { run_id, status })
            .await;

        Ok(FlowRun {
            run_id,
            flow_id: flow.flow_id.clone(),
            environment_id: env.environment_id.clone(),
            ordinal: None,
            status,
            failure_policy: policy,
            steps: results,
            scope: scope.snapshot(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn emit_skipped(&self, run_id: Uuid, skipped: &[(String, String)]) {
        for (step_id, reason) in skipped {
            self.events
                .emit(Event::StepSkipped {
                    run_id,
                    step_id: step_id.clone(),
                    reason: reason.clone(),
                })
                .await;
        }
    }
}

#[derive(Debug, Default)]
struct Settled {
    ready: Vec<String>,
    skipped: Vec<(String, String)>,
}

/// Readiness bookkeeping. Owned by the coordinating loop only.
struct Tracker<'g> {
    graph: &'g DependencyGraph,
    policy: FailurePolicy,
    continue_after_errors: bool,
    /// Predecessors not yet terminal.
    waiting: HashMap<String, usize>,
    /// First reason a step must be skipped once it stops waiting.
    blocked: HashMap<String, String>,
    terminal: HashSet<String>,
    results: Vec<StepResult>,
}

impl<'g> Tracker<'g> {
    fn new(graph: &'g DependencyGraph, policy: FailurePolicy, continue_after_errors: bool) -> Self {
        let waiting = graph
            .topo_order
            .iter()
            .map(|id| (id.clone(), graph.predecessors(id).len()))
            .collect();
        Self {
            graph,
            policy,
            continue_after_errors,
            waiting,
            blocked: HashMap::new(),
            terminal: HashSet::new(),
            results: Vec::new(),
        }
    }

    fn initially_ready(&self) -> Vec<String> {
        self.graph
            .topo_order
            .iter()
            .filter(|id| self.waiting.get(*id).copied() == Some(0))
            .cloned()
            .collect()
    }

    fn blocks_successors(&self, state: StepState) -> bool {
        match state {
            StepState::Passed => false,
            StepState::Failed => self.policy == FailurePolicy::Abort,
            StepState::Errored => !self.continue_after_errors,
            StepState::Skipped => true,
        }
    }

    /// Marks a step terminal and cascades to its successors.
    fn settle(&mut self, result: StepResult) -> Settled {
        let mut out = Settled::default();
        let mut queue = VecDeque::from([(result.step_id.clone(), result.state)]);
        self.terminal.insert(result.step_id.clone());
        self.results.push(result);

        while let Some((id, state)) = queue.pop_front() {
            let graph = self.graph;
            for next in graph.successors(&id) {
                if self.terminal.contains(next) {
                    continue;
                }
                if self.blocks_successors(state) {
                    self.blocked
                        .entry(next.clone())
                        .or_insert_with(|| format!("upstream step `{id}` {state}"));
                }
                let Some(w) = self.waiting.get_mut(next) else {
                    continue;
                };
                *w = w.saturating_sub(1);
                if *w > 0 {
                    continue;
                }
                match self.blocked.get(next) {
                    Some(reason) => {
                        let reason = reason.clone();
                        self.terminal.insert(next.clone());
                        self.results.push(StepResult::skipped(next.clone(), reason.clone()));
                        out.skipped.push((next.clone(), reason));
                        queue.push_back((next.clone(), StepState::Skipped));
                    }
                    None => out.ready.push(next.clone()),
                }
            }
        }
        out
    }

    /// Skips every step that never reached a terminal state.
    fn skip_remaining(&mut self, reason: &str) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for id in &self.graph.topo_order {
            if self.terminal.insert(id.clone()) {
                self.results.push(StepResult::skipped(id.clone(), reason));
                out.push((id.clone(), reason.to_string()));
            }
        }
        out
    }

    fn into_results(self) -> Vec<StepResult> {
        self.results
    }
}
