mod parser_unit_tests {
    use crate::{
        Limits,
        devices::{DeviceKind, InputPin, OutputPin},
        errors::{Diagnostic, ErrorKind},
        monitors::Monitors,
        names::Names,
        network::Network,
        parser::parse_source,
    };

    struct Parsed {
        ok: bool,
        diagnostics: Vec<Diagnostic>,
        names: Names,
        network: Network,
        monitors: Monitors,
    }

    fn parse_with_limits(source: &str, limits: Limits) -> Parsed {
        let mut names = Names::new();
        let mut network = Network::new(limits.max_settle_passes);
        let mut monitors = Monitors::new();
        let (ok, diagnostics) =
            parse_source(source, &mut names, &mut network, &mut monitors, limits);
        Parsed {
            ok,
            diagnostics,
            names,
            network,
            monitors,
        }
    }

    fn parse(source: &str) -> Parsed {
        parse_with_limits(source, Limits::default())
    }

    fn kinds(parsed: &Parsed) -> Vec<ErrorKind> {
        parsed.diagnostics.iter().map(|d| d.kind).collect()
    }

    /// Wraps device, connection and monitor lines in their headers.
    fn circuit(devices: &str, conns: &str, monit: &str) -> String {
        format!(
            "[devices]\n{}\n[conns]\n{}\n[monit]\n{}\n",
            devices, conns, monit
        )
    }

    const EXAMPLE: &str = "[devices]
SW1, SW2 = SWITCH(1);
G1 = AND(2);
[conns]
G1.I1 = SW1;
G1.I2 = SW2;
[monit]
G1;
";

    #[test]
    fn test_example_circuit_parses_cleanly() {
        let parsed = parse(EXAMPLE);

        assert!(parsed.ok, "{:?}", parsed.diagnostics);
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.network.devices().len(), 3);
        assert_eq!(parsed.monitors.len(), 1);
        assert!(parsed.network.undriven_inputs().is_empty());

        let g1 = parsed.names.query("G1").unwrap();
        let sw2 = parsed.names.query("SW2").unwrap();
        let device = parsed.network.devices().get(g1).unwrap();
        assert_eq!(device.kind(), DeviceKind::And);
        assert_eq!(
            device.input(InputPin::I(2)).copied().flatten().map(|d| d.device),
            Some(sw2)
        );
    }

    #[test]
    fn test_invalid_gate_input_count() {
        let parsed = parse(&circuit("G1 = AND(20);", "", ""));

        assert!(!parsed.ok);
        assert_eq!(kinds(&parsed), vec![ErrorKind::InvalidNumber]);
        assert!(parsed.diagnostics[0].message.contains("G1"));
        assert_eq!(parsed.diagnostics[0].line, 1);
    }

    #[test]
    fn test_parameter_errors() {
        let parsed = parse(&circuit(
            "X = XOR(3);\nS = SWITCH(2);\nC = CLOCK(0);\nK = CLOCK;\nD = DTYPE(7);",
            "",
            "",
        ));

        assert_eq!(
            kinds(&parsed),
            vec![
                ErrorKind::InvalidNumber,
                ErrorKind::InvalidNumber,
                ErrorKind::InvalidNumber,
                ErrorKind::MissingRequiredParameter,
            ]
        );
        // DTYPE ignores its parameter.
        assert_eq!(parsed.network.devices().len(), 1);
    }

    #[test]
    fn test_device_line_errors() {
        let parsed = parse(&circuit(
            "A = AND;\nA = OR;\nB, B = NOR;\n5 = AND;\nC = FOO;\nD AND;\nE = NAND(2;",
            "",
            "",
        ));

        assert_eq!(
            kinds(&parsed),
            vec![
                ErrorKind::NameDefined,
                ErrorKind::NameDefined,
                ErrorKind::InvalidName,
                ErrorKind::InvalidLogicGate,
                ErrorKind::SyntaxError,
                ErrorKind::SyntaxError,
            ]
        );
        // One diagnostic per line, and every later line still parsed.
        let lines: Vec<usize> = parsed.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(parsed.network.devices().len(), 2);
    }

    #[test]
    fn test_reserved_word_as_device_name() {
        let parsed = parse(&circuit("AND = OR;", "", ""));
        assert_eq!(kinds(&parsed), vec![ErrorKind::InvalidName]);
    }

    #[test]
    fn test_missing_semicolon_at_end_of_line() {
        let parsed = parse(&circuit("A = AND\nB = OR;\nC = NOR;", "", ""));

        assert_eq!(kinds(&parsed), vec![ErrorKind::SyntaxError]);
        let diagnostic = &parsed.diagnostics[0];
        assert_eq!(diagnostic.line, 1);
        assert_eq!(diagnostic.column, 4);
        assert_eq!(diagnostic.line_text, "A = AND");
        // The next line is parsed as a declaration of its own.
        for name in ["A", "B", "C"] {
            let id = parsed.names.query(name).unwrap();
            assert!(parsed.network.devices().contains(id), "{} missing", name);
        }
    }

    #[test]
    fn test_missing_semicolon_mid_line_skips_to_next() {
        let parsed = parse(&circuit("A = AND B = OR;\nC = NOR;", "", ""));

        assert_eq!(kinds(&parsed), vec![ErrorKind::SyntaxError]);
        assert_eq!(parsed.diagnostics[0].column, 8);
        assert!(!parsed.network.devices().contains(parsed.names.query("B").unwrap()));
        assert_eq!(parsed.network.devices().len(), 2);
    }

    #[test]
    fn test_connection_errors() {
        let parsed = parse(&circuit(
            "SW = SWITCH;\nG = AND(2);\nD = DTYPE;",
            "G.I1 = NOPE;\nG I1 = SW;\nG.1 = SW;\nG.FOO = SW;\nD.Q = SW;\nG.I1 = D;\nG.I1 = SW.Q;\nD = SW;\nSW = G;\nG.I3 = SW;\nD.DATA = D.X;",
            "",
        ));

        assert_eq!(
            kinds(&parsed),
            vec![
                ErrorKind::InvalidDevice,
                ErrorKind::MissingDot,
                ErrorKind::MissingI,
                ErrorKind::InvalidInputs,
                ErrorKind::InvalidPin,
                ErrorKind::MissingPort,
                ErrorKind::InvalidPin,
                ErrorKind::MissingPort,
                ErrorKind::InvalidPin,
                ErrorKind::InvalidPin,
                ErrorKind::InvalidPin,
            ]
        );
        assert_eq!(parsed.network.undriven_inputs().len(), 6);
    }

    #[test]
    fn test_sequential_gate_inputs() {
        let parsed = parse(&circuit(
            "A, B, C = SWITCH;\nG = OR(3);",
            "G = A, B, C;",
            "G;",
        ));

        assert!(parsed.ok, "{:?}", parsed.diagnostics);
        assert!(parsed.network.undriven_inputs().is_empty());
    }

    #[test]
    fn test_too_many_sources_reported_at_previous_token() {
        let parsed = parse(&circuit(
            "A, B, C = SWITCH;\nG = AND(2);",
            "G.I1 = A,\n  B,\n  C;",
            "",
        ));

        assert_eq!(kinds(&parsed), vec![ErrorKind::InvalidPin]);
        let diagnostic = &parsed.diagnostics[0];
        assert_eq!(diagnostic.line, 6);
        assert_eq!(diagnostic.column, 2);
        assert_eq!(diagnostic.line_text, "  C;");
        // The inputs that fit are still connected.
        assert!(parsed.network.undriven_inputs().is_empty());
    }

    #[test]
    fn test_already_connected_input() {
        let parsed = parse(&circuit(
            "A, B = SWITCH;\nD = DTYPE;",
            "D.DATA = A;\nD.DATA = B;\nD.CLK = A, B;",
            "",
        ));

        assert_eq!(
            kinds(&parsed),
            vec![ErrorKind::DeviceError, ErrorKind::InvalidPin]
        );
    }

    #[test]
    fn test_monitor_errors() {
        let parsed = parse(&circuit(
            "SW = SWITCH;\nD = DTYPE;",
            "",
            "SW, D.Q;\nSW;\nD;\nD.DATA;\nSW.Q;\nNOPE;",
        ));

        assert_eq!(
            kinds(&parsed),
            vec![
                ErrorKind::DeviceError,
                ErrorKind::MissingPort,
                ErrorKind::InvalidPin,
                ErrorKind::InvalidPin,
                ErrorKind::InvalidDevice,
            ]
        );
        assert_eq!(parsed.monitors.len(), 2);
        let d = parsed.names.query("D").unwrap();
        assert!(parsed.monitors.is_monitored(d, OutputPin::Q));
    }

    #[test]
    fn test_missing_devices_header() {
        let parsed = parse("[conns]\n[monit]\n");

        assert_eq!(kinds(&parsed), vec![ErrorKind::MissingHeader]);
        assert_eq!(parsed.diagnostics[0].line, 0);
    }

    #[test]
    fn test_content_before_first_header() {
        let parsed = parse("SW = SWITCH;\n[conns]\n[monit]\n");

        assert_eq!(kinds(&parsed), vec![ErrorKind::MissingHeader]);
        assert!(parsed.network.devices().is_empty());
    }

    #[test]
    fn test_missing_trailing_sections() {
        let parsed = parse("[devices]\nSW = SWITCH;\n");

        assert_eq!(
            kinds(&parsed),
            vec![ErrorKind::MissingHeader, ErrorKind::MissingHeader]
        );
        assert_eq!(parsed.network.devices().len(), 1);
    }

    #[test]
    fn test_section_after_monit() {
        let parsed = parse("[devices]\nSW = SWITCH;\n[conns]\n[monit]\nSW;\n[devices]\nX = AND;\n");

        assert_eq!(kinds(&parsed), vec![ErrorKind::InvalidHeader]);
        assert_eq!(parsed.diagnostics[0].line, 5);
        assert_eq!(parsed.network.devices().len(), 1);
    }

    #[test]
    fn test_invalid_and_repeated_headers() {
        let parsed = parse("[devices]\n[wires]\n[conns]\n[devices]\n[monit]\n");

        assert_eq!(
            kinds(&parsed),
            vec![ErrorKind::InvalidHeader, ErrorKind::InvalidHeader]
        );
    }

    #[test]
    fn test_block_overflow() {
        let limits = Limits {
            max_block_lines: 2,
            ..Limits::default()
        };
        let parsed = parse_with_limits(
            &circuit("A = AND;\nB = AND;\nC = AND;\nD = AND;", "", ""),
            limits,
        );

        assert_eq!(kinds(&parsed), vec![ErrorKind::OverflowError]);
        assert_eq!(parsed.network.devices().len(), 2);
    }

    #[test]
    fn test_scanner_diagnostics_come_first() {
        let parsed = parse(&circuit("G1 = AND(20);\nSW = SWITCH; $", "", ""));

        assert_eq!(
            kinds(&parsed),
            vec![ErrorKind::InvalidCharacter, ErrorKind::InvalidNumber]
        );
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = "# a comment\n[devices] # devices\nSW = SWITCH(1); # on\n[conns]\n[monit]\nSW;";
        let parsed = parse(source);
        assert!(parsed.ok, "{:?}", parsed.diagnostics);
        assert_eq!(parsed.monitors.len(), 1);
    }

    #[test]
    fn test_every_problem_is_reported_once() {
        let parsed = parse(&circuit(
            "G1 = AND(20);\nG2 = FOO;\nG3 = OR;",
            "G3.I1 = G9;",
            "G4;",
        ));

        assert_eq!(
            kinds(&parsed),
            vec![
                ErrorKind::InvalidNumber,
                ErrorKind::InvalidLogicGate,
                ErrorKind::InvalidDevice,
                ErrorKind::InvalidDevice,
            ]
        );
    }
}
