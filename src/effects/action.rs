//! Named, asynchronous units of work produced by resolvers.
//!
//! An action is a stillwater effect whose environment is the
//! [`ActionContext`] it runs in.

use super::dispatcher::EventDispatcher;
use super::error::ActionError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use stillwater::effect::{from_async, BoxedEffect, Effect, EffectExt};

/// Boxed effect an action runs once.
pub type ActionEffect<E, Env> = BoxedEffect<(), ActionError, ActionContext<E, Env>>;

/// Everything an action gets when it runs.
pub struct ActionContext<E, Env> {
    /// `"<machine>:<action>"`, for logs.
    pub id: String,
    pub dispatcher: Arc<dyn EventDispatcher<E>>,
    pub environment: Arc<Env>,
}

impl<E, Env> ActionContext<E, Env> {
    pub fn new(
        id: impl Into<String>,
        dispatcher: Arc<dyn EventDispatcher<E>>,
        environment: Arc<Env>,
    ) -> Self {
        Self {
            id: id.into(),
            dispatcher,
            environment,
        }
    }

    pub fn send(&self, event: E) {
        self.dispatcher.send(event);
    }
}

impl<E, Env> Clone for ActionContext<E, Env> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            environment: Arc::clone(&self.environment),
        }
    }
}

/// A side effect that must end by sending the event that moves its machine
/// out of the state that requested it.
///
/// Actions run once; executing consumes them.
///
/// # Example
///
/// ```rust
/// use authflow::effects::{Action, ActionContext, CollectingDispatcher};
/// use std::sync::Arc;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let action = Action::new("Greet", |ctx: ActionContext<&'static str, ()>| async move {
///     ctx.send("hello");
/// });
///
/// let dispatcher = Arc::new(CollectingDispatcher::new());
/// action
///     .execute(ActionContext::new("demo:Greet", dispatcher.clone(), Arc::new(())))
///     .await
///     .unwrap();
///
/// assert_eq!(dispatcher.events(), vec!["hello"]);
/// # });
/// ```
pub struct Action<E, Env> {
    name: String,
    effect: ActionEffect<E, Env>,
}

impl<E, Env> Action<E, Env>
where
    E: Send + 'static,
    Env: Send + Sync + 'static,
{
    /// Action whose body cannot fail.
    pub fn new<F, Fut>(name: impl Into<String>, effect: F) -> Self
    where
        F: FnOnce(ActionContext<E, Env>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::try_new(name, move |ctx| {
            let body = effect(ctx);
            async move {
                body.await;
                Ok::<(), ActionError>(())
            }
        })
    }

    /// Action whose body may fail. The machine hands the error to
    /// [`Resolver::on_action_failure`](crate::core::Resolver::on_action_failure).
    pub fn try_new<F, Fut>(name: impl Into<String>, effect: F) -> Self
    where
        F: FnOnce(ActionContext<E, Env>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        Self::from_effect(
            name,
            from_async(move |ctx: &ActionContext<E, Env>| effect(ctx.clone())),
        )
    }

    /// Wrap an existing effect over the action context.
    pub fn from_effect<Eff>(name: impl Into<String>, effect: Eff) -> Self
    where
        Eff: Effect<Output = (), Error = ActionError, Env = ActionContext<E, Env>> + 'static,
    {
        Self {
            name: name.into(),
            effect: effect.boxed(),
        }
    }

    /// Action that only re-dispatches `event`.
    pub fn emit(name: impl Into<String>, event: E) -> Self {
        Self::new(name, move |ctx: ActionContext<E, Env>| async move {
            ctx.send(event);
        })
    }

    pub async fn execute(self, ctx: ActionContext<E, Env>) -> Result<(), ActionError> {
        self.effect.run(&ctx).await
    }
}

impl<E, Env> Action<E, Env> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<E, Env> fmt::Debug for Action<E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::CollectingDispatcher;

    struct Greeting {
        prefix: String,
    }

    #[tokio::test]
    async fn emit_sends_exactly_one_event() {
        let dispatcher = Arc::new(CollectingDispatcher::new());
        let action: Action<u32, ()> = Action::emit("Answer", 42);

        assert_eq!(action.name(), "Answer");
        action
            .execute(ActionContext::new("test:Answer", dispatcher.clone(), Arc::new(())))
            .await
            .unwrap();

        assert_eq!(dispatcher.events(), vec![42]);
    }

    #[tokio::test]
    async fn action_reads_environment() {
        let dispatcher = Arc::new(CollectingDispatcher::new());
        let action = Action::new("Greet", |ctx: ActionContext<String, Greeting>| async move {
            let greeting = format!("{} {}", ctx.environment.prefix, ctx.id);
            ctx.send(greeting);
        });

        let env = Arc::new(Greeting {
            prefix: "hello".to_string(),
        });
        action
            .execute(ActionContext::new("machine:Greet", dispatcher.clone(), env))
            .await
            .unwrap();

        assert_eq!(dispatcher.events(), vec!["hello machine:Greet".to_string()]);
    }

    #[tokio::test]
    async fn failing_body_returns_its_error() {
        let dispatcher = Arc::new(CollectingDispatcher::<u32>::new());
        let action: Action<u32, ()> = Action::try_new("Fail", |_| async {
            Err(ActionError::Failed("no route".to_string()))
        });

        let result = action
            .execute(ActionContext::new("test:Fail", dispatcher.clone(), Arc::new(())))
            .await;

        assert_eq!(result, Err(ActionError::Failed("no route".to_string())));
        assert!(dispatcher.events().is_empty());
    }

    #[tokio::test]
    async fn wraps_stillwater_effect() {
        use stillwater::effect::asks;

        let dispatcher = Arc::new(CollectingDispatcher::new());
        let effect = asks(|ctx: &ActionContext<String, Greeting>| {
            ctx.send(ctx.environment.prefix.clone());
        });
        let action = Action::from_effect("Asks", effect);

        action
            .execute(ActionContext::new(
                "test:Asks",
                dispatcher.clone(),
                Arc::new(Greeting {
                    prefix: "hi".to_string(),
                }),
            ))
            .await
            .unwrap();

        assert_eq!(dispatcher.events(), vec!["hi".to_string()]);
    }

    #[test]
    fn debug_shows_name_only() {
        let action: Action<u32, ()> = Action::emit("Answer", 42);
        assert_eq!(format!("{action:?}"), "Action { name: \"Answer\" }");
    }
}
