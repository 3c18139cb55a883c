use crate::{
    driver::{Master, Policy},
    error::{BusError, CommandError},
    traits::TwiBus,
    ReadMode,
};
use embedded_hal::delay::DelayNs;

/// One caller supplied argument of a command string.
///
/// Arguments are consumed left to right, one per `r`/`R`/`s`/`S` or
/// `w`/`W` token encountered.
#[derive(Debug)]
pub enum CommandArg<'a> {
    /// Destination for the byte received by the next read token.
    Read(&'a mut u8),
    /// Value transmitted by the next `w`/`W` token.
    Write(u8),
}

impl<B, D> Master<B, D>
where
    B: TwiBus,
    D: DelayNs,
{
    /// Executes a bus pirate style command string against the bus.
    ///
    /// The string is scanned left to right, one character at a time:
    ///
    /// | Token | Action |
    /// |---|---|
    /// | `{` or `[` | assert a start (or repeated start) condition |
    /// | `}` or `]` | assert a stop condition |
    /// | `x` | switch the literal radix to hexadecimal |
    /// | `b` | switch the literal radix to binary |
    /// | `r` or `R` | receive one byte, acknowledging it so the device keeps sending, into the next argument |
    /// | `s` or `S` | receive one final byte without acknowledging it, into the next argument |
    /// | `w` or `W` | transmit the next argument's value immediately |
    /// | space or `,` | transmit the accumulated literal, if any, and reset the radix to decimal |
    /// | `&` | pause for one microsecond |
    /// | digit valid for the radix | accumulate into the pending literal |
    /// | anything else | ignored |
    ///
    /// Literal characters accumulate into a single byte (`pending =
    /// pending * radix + digit`, wrapping) until a delimiter transmits
    /// it, so byte literals must be separated by spaces or commas. The
    /// radix falls back to decimal at every delimiter. A literal still
    /// pending when the string ends is discarded, and a radix switch
    /// takes effect even in the middle of a literal, so `0x10b1`
    /// accumulates `0x10`, switches to binary and continues with `1`.
    ///
    /// Address frames receive no special treatment: the conventional
    /// `[ 0x72` opening simply transmits the literal 0x72, which on the
    /// wire is the address 0x39 shifted up against a write bit. Always
    /// finish a read sequence with `s` rather than `r`, otherwise the
    /// device is left expecting to send more and can hold the bus.
    ///
    /// Returns the number of read tokens executed. The argument list is
    /// checked against the string before any bus traffic; a surplus,
    /// shortfall or wrongly tagged argument fails with a
    /// [`CommandError`] while the bus is still untouched. Under
    /// [`Policy::BestEffort`] (the default) failed starts and missing
    /// acknowledgements are ignored; under [`Policy::Strict`] they abort
    /// with [`CommandError::Bus`].
    ///
    /// ```text
    /// "[ 0x72 0x8A [ 0x73 r s ]"    write 0x8A, then read two bytes
    /// args: Read(&mut hi), Read(&mut lo)
    /// ```
    pub fn run_command(
        &mut self,
        command: &str,
        args: &mut [CommandArg<'_>],
    ) -> Result<usize, CommandError> {
        check_args(command, args)?;

        let mut radix: u8 = 10;
        let mut pending: u8 = 0;
        let mut have_pending = false;
        let mut reads = 0;
        let mut next_arg = 0;

        for token in command.bytes() {
            match token {
                b'{' | b'[' => {
                    let won = self.bus.start();
                    self.guard(won, BusError::Start)?;
                }
                b'}' | b']' => self.bus.stop(),
                b'x' => radix = 16,
                b'b' => radix = 2,
                b'r' | b'R' | b's' | b'S' => {
                    let mode = if token == b's' || token == b'S' {
                        ReadMode::LastByte
                    } else {
                        ReadMode::RequestMore
                    };
                    let byte = self.bus.read_byte(mode);
                    // Argument presence and kind are verified by check_args.
                    match &mut args[next_arg] {
                        CommandArg::Read(destination) => **destination = byte,
                        CommandArg::Write(_) => unreachable!(),
                    }
                    next_arg += 1;
                    reads += 1;
                }
                b'w' | b'W' => {
                    // Argument presence and kind are verified by check_args.
                    let value = match &args[next_arg] {
                        CommandArg::Write(value) => *value,
                        CommandArg::Read(_) => unreachable!(),
                    };
                    next_arg += 1;
                    // The argument replaces whatever literal was pending
                    // and is flushed as if a delimiter followed.
                    let acked = self.bus.write_byte(value);
                    self.guard(acked, BusError::DataNack)?;
                    radix = 10;
                    pending = 0;
                    have_pending = false;
                }
                b' ' | b',' => {
                    if have_pending {
                        let acked = self.bus.write_byte(pending);
                        self.guard(acked, BusError::DataNack)?;
                    }
                    radix = 10;
                    pending = 0;
                    have_pending = false;
                }
                b'&' => self.delay.delay_us(1),
                _ => {
                    if let Some(value) = digit_value(token, radix) {
                        pending = pending.wrapping_mul(radix).wrapping_add(value);
                        have_pending = true;
                    }
                }
            }
        }

        Ok(reads)
    }

    fn guard(&self, ok: bool, error: BusError) -> Result<(), CommandError> {
        if ok || self.policy == Policy::BestEffort {
            Ok(())
        } else {
            Err(error.into())
        }
    }
}

/// Validates the argument list against the read and write tokens of the
/// command string.
fn check_args(command: &str, args: &[CommandArg<'_>]) -> Result<(), CommandError> {
    let mut expected = 0;

    for token in command.bytes() {
        let wants_read = match token {
            b'r' | b'R' | b's' | b'S' => true,
            b'w' | b'W' => false,
            _ => continue,
        };
        if expected < args.len() {
            let is_read = matches!(args[expected], CommandArg::Read(_));
            if is_read != wants_read {
                return Err(CommandError::ArgumentKind { index: expected });
            }
        }
        expected += 1;
    }

    if expected != args.len() {
        return Err(CommandError::ArgumentCount {
            expected,
            provided: args.len(),
        });
    }
    Ok(())
}

/// The value of `token` as a digit under `radix`, if it is one.
const fn digit_value(token: u8, radix: u8) -> Option<u8> {
    match (token, radix) {
        (b'0'..=b'9', 10 | 16) => Some(token - b'0'),
        (b'0'..=b'1', 2) => Some(token - b'0'),
        (b'a'..=b'f', 16) => Some(token - b'a' + 10),
        (b'A'..=b'F', 16) => Some(token - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockTwiBus;
    use assert_hex::assert_eq_hex;
    use mockall::Sequence;

    struct CountingDelay {
        us: u32,
    }

    impl CountingDelay {
        fn new() -> Self {
            Self { us: 0 }
        }
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_us(&mut self, us: u32) {
            self.us += us;
        }
    }

    #[test]
    fn decimal_literals_transmit_in_order() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_send(&mut bus, &mut seq, 10);
        expect_send(&mut bus, &mut seq, 20);
        expect_send(&mut bus, &mut seq, 250);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        let reads = master.run_command("10 20 250 ", &mut []).unwrap();

        // Then
        assert_eq!(0, reads);
    }

    #[test]
    fn radix_switches_apply_to_following_literals() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_send(&mut bus, &mut seq, 10);
        expect_send(&mut bus, &mut seq, 16);
        expect_send(&mut bus, &mut seq, 2);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("10 x10 b10 ", &mut []).unwrap();
    }

    #[test]
    fn delimiter_resets_the_radix_to_decimal() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_send(&mut bus, &mut seq, 16);
        expect_send(&mut bus, &mut seq, 10);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("x10,10,", &mut []).unwrap();
    }

    #[test]
    fn radix_switch_takes_effect_inside_a_literal() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        // 0x10 accumulated in hex, then continued in binary: 16 * 2 + 1.
        expect_send(&mut bus, &mut seq, 33);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("0x10b1 ", &mut []).unwrap();
    }

    #[test]
    fn digits_invalid_for_the_radix_are_ignored() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_send(&mut bus, &mut seq, 1);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("b21 ", &mut []).unwrap();
    }

    #[test]
    fn unknown_characters_are_ignored() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_send(&mut bus, &mut seq, 10);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("1!?0 ", &mut []).unwrap();
    }

    #[test]
    fn accumulation_wraps_modulo_256() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_send(&mut bus, &mut seq, 44);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("300 ", &mut []).unwrap();
    }

    #[test]
    fn trailing_literal_without_a_delimiter_is_dropped() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_send(&mut bus, &mut seq, 10);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("10 20", &mut []).unwrap();
    }

    #[test]
    fn read_tokens_route_bytes_to_their_destinations() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_read(&mut bus, &mut seq, ReadMode::RequestMore, 0xAB);
        expect_read(&mut bus, &mut seq, ReadMode::LastByte, 0xCD);

        // When
        let mut master = Master::new(bus, CountingDelay::new());

        let mut first = 0;
        let mut second = 0;
        let reads = master
            .run_command(
                "Rs",
                &mut [CommandArg::Read(&mut first), CommandArg::Read(&mut second)],
            )
            .unwrap();

        // Then
        assert_eq!(2, reads);
        assert_eq_hex!(0xAB, first);
        assert_eq_hex!(0xCD, second);
    }

    #[test]
    fn write_token_transmits_its_argument_exactly() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        // The accumulated 12 is replaced by the argument; the 34 after
        // the token accumulates fresh.
        expect_send(&mut bus, &mut seq, 0xAA);
        expect_send(&mut bus, &mut seq, 34);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master
            .run_command("12w34 ", &mut [CommandArg::Write(0xAA)])
            .unwrap();
    }

    #[test]
    fn braces_invoke_start_and_stop_once_each_regardless_of_result() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_start_with_result(&mut bus, &mut seq, false);
        expect_stop(&mut bus, &mut seq);
        expect_start_with_result(&mut bus, &mut seq, false);
        expect_stop(&mut bus, &mut seq);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("{ ] [ }", &mut []).unwrap();
    }

    #[test]
    fn pause_token_waits_one_microsecond_each() {
        // Given
        let bus = MockTwiBus::new();

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        master.run_command("&&&", &mut []).unwrap();

        // Then
        let (_, delay) = master.release();
        assert_eq!(3, delay.us);
    }

    #[test]
    fn transaction_with_write_and_reads() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_start(&mut bus, &mut seq);
        expect_send(&mut bus, &mut seq, 0x72);
        expect_send(&mut bus, &mut seq, 0x8A);
        expect_start(&mut bus, &mut seq);
        expect_send(&mut bus, &mut seq, 0x73);
        expect_read(&mut bus, &mut seq, ReadMode::RequestMore, 0x12);
        expect_read(&mut bus, &mut seq, ReadMode::LastByte, 0x34);
        expect_stop(&mut bus, &mut seq);

        // When
        let mut master = Master::new(bus, CountingDelay::new());

        let mut high = 0;
        let mut low = 0;
        let reads = master
            .run_command(
                "[ 0x72 w [ 0x73 r s ]",
                &mut [
                    CommandArg::Write(0x8A),
                    CommandArg::Read(&mut high),
                    CommandArg::Read(&mut low),
                ],
            )
            .unwrap();

        // Then
        assert_eq!(2, reads);
        assert_eq_hex!(0x12, high);
        assert_eq_hex!(0x34, low);
    }

    #[test]
    fn missing_arguments_fail_before_any_bus_traffic() {
        // Given
        let bus = MockTwiBus::new();

        // When
        let mut master = Master::new(bus, CountingDelay::new());

        let mut only = 0;
        let result = master.run_command("[ rs ]", &mut [CommandArg::Read(&mut only)]);

        // Then
        assert_eq!(
            Err(CommandError::ArgumentCount {
                expected: 2,
                provided: 1
            }),
            result
        );
    }

    #[test]
    fn surplus_arguments_fail_before_any_bus_traffic() {
        // Given
        let bus = MockTwiBus::new();

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        let result = master.run_command("[ 10 ]", &mut [CommandArg::Write(0x55)]);

        // Then
        assert_eq!(
            Err(CommandError::ArgumentCount {
                expected: 0,
                provided: 1
            }),
            result
        );
    }

    #[test]
    fn wrongly_tagged_argument_fails_with_its_index() {
        // Given
        let bus = MockTwiBus::new();

        // When
        let mut master = Master::new(bus, CountingDelay::new());

        let mut destination = 0;
        let result = master.run_command("w", &mut [CommandArg::Read(&mut destination)]);

        // Then
        assert_eq!(Err(CommandError::ArgumentKind { index: 0 }), result);
    }

    #[test]
    fn strict_policy_aborts_on_a_failed_start() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_start_with_result(&mut bus, &mut seq, false);

        // When
        let mut master = Master::new(bus, CountingDelay::new()).with_policy(Policy::Strict);
        let result = master.run_command("[ 10 ]", &mut []);

        // Then
        assert_eq!(Err(CommandError::Bus(BusError::Start)), result);
    }

    #[test]
    fn strict_policy_aborts_on_unacknowledged_data() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_start(&mut bus, &mut seq);
        bus.expect_write_byte()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);

        // When
        let mut master = Master::new(bus, CountingDelay::new()).with_policy(Policy::Strict);
        let result = master.run_command("[ 10 ]", &mut []);

        // Then
        assert_eq!(Err(CommandError::Bus(BusError::DataNack)), result);
    }

    #[test]
    fn best_effort_policy_completes_despite_failures() {
        // Given
        let mut seq = Sequence::new();
        let mut bus = MockTwiBus::new();

        expect_start_with_result(&mut bus, &mut seq, false);
        bus.expect_write_byte()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);
        expect_stop(&mut bus, &mut seq);

        // When
        let mut master = Master::new(bus, CountingDelay::new());
        let reads = master.run_command("[ 10 ]", &mut []).unwrap();

        // Then
        assert_eq!(0, reads);
    }

    fn expect_start(bus: &mut MockTwiBus, seq: &mut Sequence) {
        expect_start_with_result(bus, seq, true);
    }

    fn expect_start_with_result(bus: &mut MockTwiBus, seq: &mut Sequence, won: bool) {
        bus.expect_start()
            .times(1)
            .in_sequence(seq)
            .return_const(won);
    }

    fn expect_send(bus: &mut MockTwiBus, seq: &mut Sequence, byte: u8) {
        bus.expect_write_byte()
            .withf(move |&b| b == byte)
            .times(1)
            .in_sequence(seq)
            .return_const(true);
    }

    fn expect_read(bus: &mut MockTwiBus, seq: &mut Sequence, mode: ReadMode, byte: u8) {
        bus.expect_read_byte()
            .withf(move |&m| m == mode)
            .times(1)
            .in_sequence(seq)
            .return_const(byte);
    }

    fn expect_stop(bus: &mut MockTwiBus, seq: &mut Sequence) {
        bus.expect_stop().times(1).in_sequence(seq).return_const(());
    }
}
