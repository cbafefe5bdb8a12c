//! Dispatcher-level tests: real state and handlers, in-memory send buffers,
//! no sockets.

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::error::HandlerError;
use crate::handlers::{Context, Registry};
use crate::server::ServerInfo;
use crate::state::{ServerState, Session, SessionId, SessionIdGen};

struct Fixture {
    state: ServerState,
    info: ServerInfo,
    registry: Registry,
    ids: SessionIdGen,
    rxs: HashMap<SessionId, mpsc::UnboundedReceiver<String>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            state: ServerState::new(),
            info: ServerInfo {
                name: "lark.test".into(),
                network: "Lark".into(),
                version: "0.0-test".into(),
                created: "Thu Jan  1 2026 at 00:00:00 UTC".into(),
                password: "secret".into(),
            },
            registry: Registry::new(),
            ids: SessionIdGen::new(),
            rxs: HashMap::new(),
        }
    }

    fn connect(&mut self) -> SessionId {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.ids.next_id();
        let addr = SocketAddr::from(([127, 0, 0, 1], 50000 + self.rxs.len() as u16));
        self.state.insert_session(Session::new(id, addr, tx));
        self.rxs.insert(id, rx);
        id
    }

    /// Dispatch one line; a quit request comes back as the resolved reason.
    fn line(&mut self, id: SessionId, line: &str) -> Option<String> {
        let mut ctx = Context {
            id,
            state: &mut self.state,
            server: &self.info,
        };
        match self.registry.dispatch(&mut ctx, line) {
            Ok(()) => None,
            Err(HandlerError::Quit(reason)) => {
                Some(reason.unwrap_or_else(|| "Client quit".into()))
            }
            Err(_) => None,
        }
    }

    fn drain(&mut self, id: SessionId) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(rx) = self.rxs.get_mut(&id) {
            while let Ok(line) = rx.try_recv() {
                out.push(line);
            }
        }
        out
    }

    fn register(&mut self, id: SessionId, nick: &str) {
        self.line(id, "PASS secret");
        self.line(id, &format!("NICK {nick}"));
        self.line(id, &format!("USER {nick} 0 * :{nick}"));
        let burst = self.drain(id);
        assert!(
            burst.iter().any(|l| l.contains(" 001 ")),
            "welcome burst missing: {burst:?}"
        );
    }
}

#[test]
fn welcome_burst_in_order() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.line(alice, "PASS secret");
    fx.line(alice, "NICK alice");
    fx.line(alice, "USER alice 0 * :Alice A");

    let burst = fx.drain(alice);
    assert_eq!(burst.len(), 4);
    assert_eq!(
        burst[0],
        ":lark.test 001 alice :Welcome to the Internet Relay Network alice!alice@127.0.0.1"
    );
    assert!(burst[1].starts_with(":lark.test 002 alice :Your host is lark.test"));
    assert!(burst[2].starts_with(":lark.test 003 alice :This server was created"));
    assert_eq!(burst[3], ":lark.test 004 alice lark.test 0.0-test o itkol");
}

#[test]
fn registration_completes_in_any_order() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    // NICK before PASS is fine; USER before PASS is not.
    fx.line(alice, "NICK alice");
    fx.line(alice, "USER alice 0 * :Alice A");
    let replies = fx.drain(alice);
    assert_eq!(replies, vec![":lark.test 464 alice :You must send PASS first"]);

    fx.line(alice, "PASS secret");
    fx.line(alice, "USER alice 0 * :Alice A");
    let burst = fx.drain(alice);
    assert!(burst[0].contains(" 001 "));
}

#[test]
fn wrong_password_rejected() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.line(alice, "PASS wrong");
    assert_eq!(fx.drain(alice), vec![":lark.test 464 * :Password incorrect"]);

    // A correct PASS afterwards still works, and resending it is harmless.
    fx.line(alice, "PASS secret");
    fx.line(alice, "PASS secret");
    assert!(fx.drain(alice).is_empty());
}

#[test]
fn bare_pass_needs_a_parameter() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.line(alice, "PASS");
    assert_eq!(
        fx.drain(alice),
        vec![":lark.test 461 * PASS :Not enough parameters"]
    );
}

#[test]
fn registering_twice_is_rejected() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.register(alice, "alice");

    fx.line(alice, "USER again 0 * :Again");
    assert_eq!(
        fx.drain(alice),
        vec![":lark.test 462 alice :You may not reregister"]
    );
    fx.line(alice, "PASS secret");
    assert_eq!(
        fx.drain(alice),
        vec![":lark.test 462 alice :You may not reregister"]
    );
}

#[test]
fn nickname_validation_and_collision() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.register(alice, "alice");

    let bob = fx.connect();
    fx.line(bob, "PASS secret");
    fx.line(bob, "NICK 9bad");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 432 * 9bad :Erroneous nickname"]
    );
    fx.line(bob, "NICK alice");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 433 * alice :Nickname is already in use"]
    );
    fx.line(bob, "NICK");
    assert_eq!(fx.drain(bob), vec![":lark.test 431 * :No nickname given"]);
}

#[test]
fn unknown_command_replies_421_with_star_target() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.line(alice, "bogus one two");
    assert_eq!(
        fx.drain(alice),
        vec![":lark.test 421 * BOGUS :Unknown command"]
    );
}

#[test]
fn empty_lines_are_ignored() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.line(alice, "");
    fx.line(alice, "   ");
    assert!(fx.drain(alice).is_empty());
}

#[test]
fn commands_before_registration_are_ignored() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.line(alice, "JOIN #test");
    fx.line(alice, "PRIVMSG nobody :hi");
    fx.line(alice, "MODE #test +i");
    assert!(fx.drain(alice).is_empty());
    assert!(!fx.state.has_channel("#test"));
}

#[test]
fn join_creates_channel_and_grants_operator() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.register(alice, "alice");

    fx.line(alice, "JOIN #test");
    let replies = fx.drain(alice);
    assert_eq!(
        replies,
        vec![
            ":alice!alice@127.0.0.1 JOIN #test",
            ":lark.test 331 alice #test :No topic is set",
            ":lark.test 353 alice = #test :@alice",
            ":lark.test 366 alice #test :End of /NAMES list",
        ]
    );
    let chan = fx.state.channel("#test").unwrap();
    assert!(chan.is_operator(alice));
}

#[test]
fn only_the_first_joiner_becomes_operator() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(bob, "JOIN #test");

    let bob_replies = fx.drain(bob);
    assert_eq!(bob_replies[0], ":bob!bob@127.0.0.1 JOIN #test");
    assert!(bob_replies.iter().any(|l| l.contains("353 bob = #test :@alice bob")));

    // Alice sees the join broadcast too.
    assert_eq!(fx.drain(alice), vec![":bob!bob@127.0.0.1 JOIN #test"]);

    let chan = fx.state.channel("#test").unwrap();
    assert_eq!(chan.member_count(), 2);
    assert!(!chan.is_operator(bob));
}

#[test]
fn one_bad_channel_does_not_abort_a_multi_join() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.register(alice, "alice");

    fx.line(alice, "JOIN #a,bad,#c");
    let replies = fx.drain(alice);
    assert!(replies.contains(&":lark.test 403 alice bad :No such channel".to_string()));
    assert!(fx.state.has_channel("#a"));
    assert!(fx.state.has_channel("#c"));
    assert!(!fx.state.has_channel("bad"));
}

#[test]
fn channel_message_reaches_everyone_but_the_sender() {
    let mut fx = Fixture::new();
    let ids: Vec<_> = (0..3).map(|_| fx.connect()).collect();
    for (i, &id) in ids.iter().enumerate() {
        fx.register(id, &format!("user{i}"));
        fx.line(id, "JOIN #test");
    }
    for &id in &ids {
        fx.drain(id);
    }

    fx.line(ids[0], "PRIVMSG #test :hello all");
    assert!(fx.drain(ids[0]).is_empty());
    let expected = ":user0!user0@127.0.0.1 PRIVMSG #test :hello all".to_string();
    assert_eq!(fx.drain(ids[1]), vec![expected.clone()]);
    assert_eq!(fx.drain(ids[2]), vec![expected]);
}

#[test]
fn direct_message_and_missing_nick() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "PRIVMSG bob :psst");
    assert_eq!(fx.drain(bob), vec![":alice!alice@127.0.0.1 PRIVMSG bob :psst"]);

    fx.line(alice, "PRIVMSG ghost :anyone");
    assert_eq!(
        fx.drain(alice),
        vec![":lark.test 401 alice ghost :No such nick/channel"]
    );

    fx.line(alice, "PRIVMSG bob :");
    assert_eq!(fx.drain(alice), vec![":lark.test 412 alice :No text to send"]);
}

#[test]
fn notice_failures_are_silent() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.register(alice, "alice");

    fx.line(alice, "NOTICE ghost :anyone");
    fx.line(alice, "NOTICE #nowhere :anyone");
    fx.line(alice, "NOTICE");
    assert!(fx.drain(alice).is_empty());
}

#[test]
fn key_gate_rejects_and_admits() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(alice, "MODE #test +k pw");
    fx.drain(alice);

    fx.line(bob, "JOIN #test");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 475 bob #test :Cannot join channel (+k)"]
    );
    assert_eq!(fx.state.channel("#test").unwrap().member_count(), 1);
    assert!(fx.drain(alice).is_empty());

    fx.line(bob, "JOIN #test pw");
    let replies = fx.drain(bob);
    assert_eq!(replies[0], ":bob!bob@127.0.0.1 JOIN #test");
    assert_eq!(fx.state.channel("#test").unwrap().member_count(), 2);
}

#[test]
fn limit_gate_rejects_when_full() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(alice, "MODE #test +l 1");
    fx.drain(alice);

    fx.line(bob, "JOIN #test");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 471 bob #test :Cannot join channel (+l)"]
    );
}

#[test]
fn invite_flow_and_session_keyed_invites() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(alice, "MODE #test +i");
    fx.drain(alice);

    fx.line(bob, "JOIN #test");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 473 bob #test :Cannot join channel (+i)"]
    );

    fx.line(alice, "INVITE bob #test");
    assert_eq!(fx.drain(alice), vec![":lark.test 341 alice bob #test"]);
    assert_eq!(
        fx.drain(bob),
        vec![":alice!alice@127.0.0.1 INVITE bob #test"]
    );

    // The invite is keyed to the session, so it survives a rename.
    fx.line(bob, "NICK bobby");
    fx.drain(bob);
    fx.line(bob, "JOIN #test");
    let replies = fx.drain(bob);
    assert_eq!(replies[0], ":bobby!bob@127.0.0.1 JOIN #test");
}

#[test]
fn invite_requires_membership_and_op_when_invite_only() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    let eve = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");
    fx.register(eve, "eve");

    fx.line(alice, "JOIN #test");
    fx.line(alice, "MODE #test +i");
    fx.drain(alice);

    fx.line(eve, "INVITE bob #test");
    assert_eq!(
        fx.drain(eve),
        vec![":lark.test 442 eve #test :You're not on that channel"]
    );
}

#[test]
fn kick_strips_membership_and_operator_status() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(bob, "JOIN #test");
    fx.drain(bob);
    fx.line(alice, "MODE #test +o bob");
    fx.drain(alice);
    fx.drain(bob);

    fx.line(alice, "KICK #test bob :misbehaving");
    let kick = ":alice!alice@127.0.0.1 KICK #test bob :misbehaving".to_string();
    assert_eq!(fx.drain(alice), vec![kick.clone()]);
    assert_eq!(fx.drain(bob), vec![kick]);

    let chan = fx.state.channel("#test").unwrap();
    assert_eq!(chan.member_count(), 1);
    assert!(!chan.is_member(bob));
    assert!(!chan.is_operator(bob));

    // Bob's own membership record is gone too.
    fx.line(bob, "PART #test");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 442 bob #test :You're not on that channel"]
    );
}

#[test]
fn kick_requires_operator() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(bob, "JOIN #test");
    fx.drain(bob);
    fx.drain(alice);

    fx.line(bob, "KICK #test alice");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 482 bob #test :You're not channel operator"]
    );
}

#[test]
fn topic_query_set_and_protection() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(bob, "JOIN #test");
    fx.drain(bob);
    fx.drain(alice);

    fx.line(bob, "TOPIC #test");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 331 bob #test :No topic is set"]
    );

    fx.line(alice, "MODE #test +t");
    fx.drain(alice);
    fx.drain(bob);

    fx.line(bob, "TOPIC #test :bob was here");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 482 bob #test :You're not channel operator"]
    );

    fx.line(alice, "TOPIC #test :welcome to #test");
    let broadcast = ":alice!alice@127.0.0.1 TOPIC #test :welcome to #test".to_string();
    assert_eq!(fx.drain(alice), vec![broadcast.clone()]);
    assert_eq!(fx.drain(bob), vec![broadcast]);

    fx.line(bob, "TOPIC #test");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 332 bob #test :welcome to #test"]
    );

    // A fresh joiner sees the topic in the join replies.
    let carol = fx.connect();
    fx.register(carol, "carol");
    fx.line(carol, "JOIN #test");
    let replies = fx.drain(carol);
    assert!(replies.contains(&":lark.test 332 carol #test :welcome to #test".to_string()));
}

#[test]
fn mode_broadcast_reflects_only_applied_changes() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(bob, "JOIN #test");
    fx.drain(bob);
    fx.drain(alice);

    // +k with a key and +x unknown: the broadcast carries only +k.
    fx.line(alice, "MODE #test +kx pw");
    let alice_replies = fx.drain(alice);
    assert!(alice_replies.contains(&":lark.test 472 alice x :is unknown mode char to me".to_string()));
    let broadcast = ":alice!alice@127.0.0.1 MODE #test +k pw".to_string();
    assert!(alice_replies.contains(&broadcast));
    assert_eq!(fx.drain(bob), vec![broadcast]);

    // +l with a non-numeric parameter applies nothing and echoes nothing.
    fx.line(alice, "MODE #test +l many");
    assert!(fx.drain(alice).is_empty());
    assert!(fx.drain(bob).is_empty());
    assert_eq!(fx.state.channel("#test").unwrap().modes().limit, None);

    // A mixed string collapses signs and keeps parameter order.
    fx.line(alice, "MODE #test +it-k");
    let broadcast = ":alice!alice@127.0.0.1 MODE #test +it-k".to_string();
    assert!(fx.drain(alice).contains(&broadcast));
    assert_eq!(fx.drain(bob), vec![broadcast]);
}

#[test]
fn mode_query_lists_flags_without_parameters() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.register(alice, "alice");
    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(alice, "MODE #test +tk pw");
    fx.drain(alice);

    fx.line(alice, "MODE #test");
    assert_eq!(fx.drain(alice), vec![":lark.test 324 alice #test +tk"]);
}

#[test]
fn mode_changes_require_operator() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(bob, "JOIN #test");
    fx.drain(bob);
    fx.drain(alice);

    fx.line(bob, "MODE #test +i");
    assert_eq!(
        fx.drain(bob),
        vec![":lark.test 482 bob #test :You're not channel operator"]
    );
    assert!(!fx.state.channel("#test").unwrap().modes().invite_only);
}

#[test]
fn part_destroys_an_emptied_channel() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.register(alice, "alice");

    fx.line(alice, "JOIN #test");
    fx.drain(alice);
    fx.line(alice, "PART #test :done here");
    assert_eq!(
        fx.drain(alice),
        vec![":alice!alice@127.0.0.1 PART #test :done here"]
    );
    assert!(!fx.state.has_channel("#test"));

    // Recreating it starts from scratch: fresh modes, fresh operator grant.
    fx.line(alice, "JOIN #test");
    let replies = fx.drain(alice);
    assert!(replies.iter().any(|l| l.contains("353 alice = #test :@alice")));
}

#[test]
fn names_without_parameter_is_just_end_of_list() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.register(alice, "alice");
    fx.line(alice, "NAMES");
    assert_eq!(
        fx.drain(alice),
        vec![":lark.test 366 alice * :End of /NAMES list"]
    );

    fx.line(alice, "NAMES #nowhere");
    assert_eq!(
        fx.drain(alice),
        vec![":lark.test 403 alice #nowhere :No such channel"]
    );
}

#[test]
fn nick_change_is_announced_once_across_shared_channels() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    let bob = fx.connect();
    fx.register(alice, "alice");
    fx.register(bob, "bob");

    for chan in ["#a", "#b"] {
        fx.line(alice, &format!("JOIN {chan}"));
        fx.line(bob, &format!("JOIN {chan}"));
    }
    fx.drain(alice);
    fx.drain(bob);

    fx.line(alice, "NICK alicia");
    let expected = ":alice!alice@127.0.0.1 NICK :alicia".to_string();
    assert_eq!(fx.drain(bob), vec![expected.clone()]);
    assert_eq!(fx.drain(alice), vec![expected]);

    // The old nickname is free again.
    assert!(fx.state.find_nick("alice").is_none());
    assert_eq!(fx.state.find_nick("alicia"), Some(alice));
}

#[test]
fn ping_echoes_the_token() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    fx.line(alice, "PING :12345");
    assert_eq!(fx.drain(alice), vec![":lark.test PONG lark.test :12345"]);
    fx.line(alice, "PING");
    assert_eq!(
        fx.drain(alice),
        vec![":lark.test 461 * PING :Not enough parameters"]
    );
}

#[test]
fn quit_escapes_to_the_control_loop() {
    let mut fx = Fixture::new();
    let alice = fx.connect();
    assert_eq!(fx.line(alice, "QUIT :gone fishing"), Some("gone fishing".into()));
    assert_eq!(fx.line(alice, "QUIT"), Some("Client quit".into()));
}
