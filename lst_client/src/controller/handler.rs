use actix::{ActorFutureExt, AsyncContext, ContextFutureSpawner, Handler, MessageResult, WrapFuture};
use tracing::{info, warn};

use super::message::{
    ActionDropped, GetSnapshot, ResetRequested, Subscribe, UsernameBlurred, UsernameFocused,
    UsernameInput,
};
use super::GameController;

impl Handler<ActionDropped> for GameController {
    type Result = ();

    fn handle(&mut self, msg: ActionDropped, ctx: &mut Self::Context) -> Self::Result {
        let action = msg.0;

        // 세션 키가 없으면 전송하지 않음
        let Some((ticket, session_key)) = self.lifecycle.submit_action() else {
            warn!("Action dropped before session was identified; ignoring");
            return;
        };
        info!(
            "Submitting action #{}: player {} -> opponent {}",
            ticket.generation, action.from.position, action.to.position
        );
        self.publish();

        let backend = self.backend.clone();
        async move { backend.send_action(&action, &session_key).await }
            .into_actor(self)
            .map(move |result, act, _ctx| {
                let settle = act.lifecycle.finish_action(ticket, result);
                act.on_settled(ticket, settle);
            })
            .spawn(ctx);
    }
}

impl Handler<ResetRequested> for GameController {
    type Result = ();

    fn handle(&mut self, _msg: ResetRequested, ctx: &mut Self::Context) -> Self::Result {
        // 요청 결과와 상관없이 펄스는 정해진 시간 동안만 켜짐
        let token = self.pulse.start();
        ctx.run_later(self.pulse.duration(), move |act, _ctx| {
            if act.pulse.clear(token) {
                act.publish();
            }
        });

        let Some((ticket, session_key)) = self.lifecycle.begin_reset() else {
            warn!("Reset requested before session was identified; ignoring");
            self.publish();
            return;
        };
        info!("Submitting reset #{}", ticket.generation);
        self.publish();

        let backend = self.backend.clone();
        async move { backend.send_reset(&session_key).await }
            .into_actor(self)
            .map(move |result, act, _ctx| {
                let settle = act.lifecycle.finish_reset(ticket, result);
                act.on_settled(ticket, settle);
            })
            .spawn(ctx);
    }
}

impl Handler<UsernameFocused> for GameController {
    type Result = ();

    fn handle(&mut self, _msg: UsernameFocused, _ctx: &mut Self::Context) -> Self::Result {
        self.editor.focus();
        self.publish();
    }
}

impl Handler<UsernameInput> for GameController {
    type Result = ();

    fn handle(&mut self, msg: UsernameInput, _ctx: &mut Self::Context) -> Self::Result {
        if self.editor.input(msg.0) {
            self.publish();
        } else {
            warn!("Username input received while not editing");
        }
    }
}

impl Handler<UsernameBlurred> for GameController {
    type Result = ();

    fn handle(&mut self, _msg: UsernameBlurred, ctx: &mut Self::Context) -> Self::Result {
        let Some(username) = self.editor.blur() else {
            return;
        };

        let Some(session_key) = self.lifecycle.session_key().map(str::to_owned) else {
            warn!("Username submitted before session was identified; ignoring");
            self.editor.finish_submit(&username, false);
            self.publish();
            return;
        };
        self.publish();

        let backend = self.backend.clone();
        let submitted = username.clone();
        async move { backend.send_username(&submitted, &session_key).await }
            .into_actor(self)
            .map(move |ok, act, _ctx| {
                act.editor.finish_submit(&username, ok);
                if ok {
                    act.lifecycle.set_username(&username);
                    info!("Username updated to {:?}", username);
                }
                act.publish();
            })
            .spawn(ctx);
    }
}

impl Handler<GetSnapshot> for GameController {
    type Result = MessageResult<GetSnapshot>;

    fn handle(&mut self, _msg: GetSnapshot, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.snapshot())
    }
}

impl Handler<Subscribe> for GameController {
    type Result = MessageResult<Subscribe>;

    fn handle(&mut self, _msg: Subscribe, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.subscribe())
    }
}
