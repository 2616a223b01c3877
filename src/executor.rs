// Copyright 2026 DagFlow Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A small pool of worker threads that runs tasklets to quiescence with
//! fairness.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_deque::{Injector, Steal, Stealer, Worker};
use parking_lot::Mutex as PLMutex;

use crate::config::ExecutorConfig;
use crate::dag::{Dag, Payload};
use crate::error::Result;
use crate::tasklet::{Tasklet, TaskletProgress};

/// A runnable unit on the shared deque. Non-cooperative tasklets are not
/// scheduled onto the work-stealing pool at all; they get a dedicated thread
///.
struct RunnableTasklet<T> {
    tasklet: PLMutex<Tasklet<T>>,
}

/// Runs a frozen set of tasklets to completion. Cooperative tasklets share a
/// small work-stealing thread pool; non-cooperative ones get a thread each.
pub struct Executor<T: Send + 'static> {
    config: ExecutorConfig,
    cooperative: Vec<Arc<RunnableTasklet<T>>>,
    non_cooperative: Vec<Tasklet<T>>,
    cancelled: Arc<AtomicBool>,
}

impl<T: Payload> Executor<T> {
    /// Wires `dag` (see [`Dag::wire`]) and builds the executor that will run it.
    /// The external submitter's whole interaction with a DAG is: build it with
    /// [`crate::dag::DagBuilder`], `freeze()` it, then hand it here.
    pub fn from_dag(dag: Dag<T>, config: ExecutorConfig) -> Self {
        let tasklets = dag.wire(&config);
        Self::new(config, tasklets)
    }
}

impl<T: Clone + Send + 'static> Executor<T> {
    pub fn new(config: ExecutorConfig, tasklets: Vec<Tasklet<T>>) -> Self {
        let mut cooperative = Vec::new();
        let mut non_cooperative = Vec::new();
        for t in tasklets {
            if t.is_cooperative() {
                cooperative.push(Arc::new(RunnableTasklet {
                    tasklet: PLMutex::new(t),
                }));
            } else {
                non_cooperative.push(t);
            }
        }
        Self {
            config,
            cooperative,
            non_cooperative,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle that [`Self::run`] callers can use to request a clean
    /// shutdown: the executor checks a cancel flag between tasklet calls.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: self.cancelled.clone(),
        }
    }

    /// Runs every tasklet to quiescence (all report `Done`) or until
    /// cancelled. Returns `Ok(())` on normal completion, or the first error
    /// raised by any tasklet — `ProcessorFailure`/`WatermarkMisorder` are
    /// fatal to the job.
    pub fn run(self) -> Result<()> {
        let injector: Arc<Injector<Arc<RunnableTasklet<T>>>> = Arc::new(Injector::new());
        for t in &self.cooperative {
            injector.push(t.clone());
        }
        let remaining = Arc::new(AtomicUsize::new(self.cooperative.len()));
        let first_error: Arc<Mutex<Option<crate::error::Error>>> = Arc::new(Mutex::new(None));

        let worker_count = self.config.worker_count.max(1);
        let workers: Vec<Worker<Arc<RunnableTasklet<T>>>> =
            (0..worker_count).map(|_| Worker::new_fifo()).collect();
        let stealers: Vec<Stealer<Arc<RunnableTasklet<T>>>> =
            workers.iter().map(|w| w.stealer()).collect();

        let mut handles: Vec<JoinHandle<()>> = Vec::new();
        for worker in workers {
            let injector = injector.clone();
            let stealers = stealers.clone();
            let remaining = remaining.clone();
            let cancelled = self.cancelled.clone();
            let first_error = first_error.clone();
            let spin_iterations = self.config.spin_iterations;
            let park_timeout = Duration::from_micros(self.config.park_timeout_micros);

            handles.push(thread::spawn(move || {
                worker_loop(
                    worker,
                    injector,
                    stealers,
                    remaining,
                    cancelled,
                    first_error,
                    spin_iterations,
                    park_timeout,
                );
            }));
        }

        for mut tasklet in self.non_cooperative {
            let cancelled = self.cancelled.clone();
            while !tasklet.is_done() && !cancelled.load(Ordering::Acquire) {
                match tasklet.call() {
                    Ok(TaskletProgress::Done) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tasklet.shutdown();
                        return Err(e);
                    }
                }
            }
            tasklet.shutdown();
        }

        for h in handles {
            let _ = h.join();
        }

        if let Some(err) = first_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }
}

/// Lets a caller request cancellation from outside [`Executor::run`].
#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop<T: Clone + Send + 'static>(
    local: Worker<Arc<RunnableTasklet<T>>>,
    injector: Arc<Injector<Arc<RunnableTasklet<T>>>>,
    stealers: Vec<Stealer<Arc<RunnableTasklet<T>>>>,
    remaining: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
    first_error: Arc<Mutex<Option<crate::error::Error>>>,
    spin_iterations: u32,
    park_timeout: Duration,
) {
    let mut idle_spins = 0u32;

    loop {
        if cancelled.load(Ordering::Acquire) || remaining.load(Ordering::Acquire) == 0 {
            break;
        }

        let task = find_task(&local, &injector, &stealers);
        let Some(runnable) = task else {
            idle_spins += 1;
            if idle_spins > spin_iterations {
                thread::sleep(park_timeout);
                idle_spins = 0;
            } else {
                thread::yield_now();
            }
            continue;
        };
        idle_spins = 0;

        let outcome = {
            let mut tasklet = runnable.tasklet.lock();
            tasklet.call()
        };

        match outcome {
            Ok(TaskletProgress::Done) => {
                runnable.tasklet.lock().shutdown();
                remaining.fetch_sub(1, Ordering::AcqRel);
            }
            Ok(TaskletProgress::MadeProgress) => {
                injector.push(runnable);
            }
            Ok(TaskletProgress::NoProgress) => {
                injector.push(runnable);
            }
            Err(e) => {
                runnable.tasklet.lock().shutdown();
                let mut slot = first_error.lock().unwrap();
                if slot.is_none() {
                    *slot = Some(e);
                }
                cancelled.store(true, Ordering::Release);
                remaining.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }
}

fn find_task<T>(
    local: &Worker<Arc<RunnableTasklet<T>>>,
    injector: &Injector<Arc<RunnableTasklet<T>>>,
    stealers: &[Stealer<Arc<RunnableTasklet<T>>>],
) -> Option<Arc<RunnableTasklet<T>>> {
    local.pop().or_else(|| loop {
        match injector.steal_batch_and_pop(local) {
            Steal::Success(task) => return Some(task),
            Steal::Empty => break None,
            Steal::Retry => continue,
        }
    }).or_else(|| {
        stealers.iter().find_map(|s| loop {
            match s.steal() {
                Steal::Success(task) => return Some(task),
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        })
    })
}
