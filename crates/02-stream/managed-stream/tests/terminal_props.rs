//! Property checks for exactly-once termination under arbitrary call mixes.

#![cfg(not(feature = "loom"))]

mod common;

use common::{gated_stream, spied_stream};
use futures::executor::block_on;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use managed_stream::{AbortOptions, ErrorCode, StreamResult};
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Terminal {
    Close,
    Abort(u8),
}

fn terminal_calls() -> impl Strategy<Value = Vec<Terminal>> {
    proptest::collection::vec(
        prop_oneof![Just(Terminal::Close), (0u8..16).prop_map(Terminal::Abort)],
        1..24,
    )
}

fn issue<'a>(
    stream: &'a common::SpiedStream<u32>,
    call: Terminal,
) -> BoxFuture<'a, StreamResult<()>> {
    match call {
        Terminal::Close => stream.close().map(|r| r.map(|_| ())).boxed(),
        Terminal::Abort(n) => stream
            .abort_with(format!("reason {n}"), AbortOptions::code(ErrorCode::Expired))
            .map(|r| r.map(|_| ()))
            .boxed(),
    }
}

proptest! {
    #[test]
    fn first_terminal_call_is_the_only_effect(calls in terminal_calls()) {
        let stream = spied_stream::<u32>();
        let results = block_on(join_all(calls.iter().map(|&call| issue(&stream, call))));

        prop_assert!(results.iter().all(Result::is_ok));
        prop_assert!(stream.closed());
        prop_assert!(!stream.is_closing());

        let recorded = stream.writer().calls();
        prop_assert_eq!(recorded.closes + recorded.aborts.len(), 1);
        match calls[0] {
            Terminal::Close => {
                prop_assert_eq!(recorded.closes, 1);
                prop_assert_eq!(recorded.releases, 1);
            }
            Terminal::Abort(n) => {
                let abort = recorded.aborts[0].as_aborted().expect("abort cause");
                prop_assert_eq!(abort.message(), format!("reason {n}"));
                prop_assert_eq!(abort.code(), ErrorCode::Expired);
                prop_assert_eq!(recorded.releases, 0);
            }
        }
    }

    #[test]
    fn in_flight_terminal_call_absorbs_the_rest(calls in terminal_calls()) {
        let (stream, open) = gated_stream::<u32>();

        let (first, rest) = block_on(async {
            let mut first = issue(&stream, calls[0]);
            let pending = futures::poll!(first.as_mut()).is_pending();
            let rest = join_all(calls[1..].iter().map(|&call| issue(&stream, call))).await;
            let closing_during = stream.is_closing();
            open.send(()).expect("gate");
            first.await.expect("first call");
            (pending && closing_during, rest)
        });

        prop_assert!(first);
        prop_assert!(rest.iter().all(Result::is_ok));
        let recorded = stream.writer().calls();
        prop_assert_eq!(recorded.closes + recorded.aborts.len(), 1);
        prop_assert!(stream.closed());
    }
}
