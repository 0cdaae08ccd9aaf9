/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Space-group table
//!
//! For each of the 230 groups: the Hall symbol of the default setting, the
//! Hall symbol of the alternative setting where one exists (origin choice 2,
//! or rhombohedral axes for the R groups), and the full Hermann-Mauguin symbol
//! in the notation that carries the glide and screw information.

/// One row of the space-group table
#[derive(Debug, Clone, Copy)]
pub struct SpaceGroupEntry {
    pub number: u16,
    pub hall: &'static str,
    pub hall_alternative: Option<&'static str>,
    pub hermann_mauguin: &'static str,
}

const fn sg(number: u16, hall: &'static str, hermann_mauguin: &'static str) -> SpaceGroupEntry {
    SpaceGroupEntry {
        number,
        hall,
        hall_alternative: None,
        hermann_mauguin,
    }
}

const fn sg2(
    number: u16,
    hall: &'static str,
    alternative: &'static str,
    hermann_mauguin: &'static str,
) -> SpaceGroupEntry {
    SpaceGroupEntry {
        number,
        hall,
        hall_alternative: Some(alternative),
        hermann_mauguin,
    }
}

/// Numbers of the groups whose alternative setting uses rhombohedral axes
pub const RHOMBOHEDRAL_GROUPS: [u16; 7] = [146, 148, 155, 160, 161, 166, 167];

pub static SPACE_GROUPS: [SpaceGroupEntry; 230] = [
    // triclinic
    sg(1, "P 1", "P 1"),
    sg(2, "-P 1", "P -1"),
    // monoclinic, unique axis b
    sg(3, "P 2y", "P 1 2 1"),
    sg(4, "P 2yb", "P 1 21 1"),
    sg(5, "C 2y", "C 1 2 1"),
    sg(6, "P -2y", "P 1 m 1"),
    sg(7, "P -2yc", "P 1 c 1"),
    sg(8, "C -2y", "C 1 m 1"),
    sg(9, "C -2yc", "C 1 c 1"),
    sg(10, "-P 2y", "P 1 2/m 1"),
    sg(11, "-P 2yb", "P 1 21/m 1"),
    sg(12, "-C 2y", "C 1 2/m 1"),
    sg(13, "-P 2yc", "P 1 2/c 1"),
    sg(14, "-P 2ybc", "P 1 21/c 1"),
    sg(15, "-C 2yc", "C 1 2/c 1"),
    // orthorhombic
    sg(16, "P 2 2", "P 2 2 2"),
    sg(17, "P 2c 2", "P 2 2 21"),
    sg(18, "P 2 2ab", "P 21 21 2"),
    sg(19, "P 2ac 2ab", "P 21 21 21"),
    sg(20, "C 2c 2", "C 2 2 21"),
    sg(21, "C 2 2", "C 2 2 2"),
    sg(22, "F 2 2", "F 2 2 2"),
    sg(23, "I 2 2", "I 2 2 2"),
    sg(24, "I 2b 2c", "I 21 21 21"),
    sg(25, "P 2 -2", "P m m 2"),
    sg(26, "P 2c -2", "P m c 21"),
    sg(27, "P 2 -2c", "P c c 2"),
    sg(28, "P 2 -2a", "P m a 2"),
    sg(29, "P 2c -2ac", "P c a 21"),
    sg(30, "P 2 -2bc", "P n c 2"),
    sg(31, "P 2ac -2", "P m n 21"),
    sg(32, "P 2 -2ab", "P b a 2"),
    sg(33, "P 2c -2n", "P n a 21"),
    sg(34, "P 2 -2n", "P n n 2"),
    sg(35, "C 2 -2", "C m m 2"),
    sg(36, "C 2c -2", "C m c 21"),
    sg(37, "C 2 -2c", "C c c 2"),
    sg(38, "A 2 -2", "A m m 2"),
    sg(39, "A 2 -2c", "A b m 2"),
    sg(40, "A 2 -2a", "A m a 2"),
    sg(41, "A 2 -2ac", "A b a 2"),
    sg(42, "F 2 -2", "F m m 2"),
    sg(43, "F 2 -2d", "F d d 2"),
    sg(44, "I 2 -2", "I m m 2"),
    sg(45, "I 2 -2c", "I b a 2"),
    sg(46, "I 2 -2a", "I m a 2"),
    sg(47, "-P 2 2", "P 2/m 2/m 2/m"),
    sg2(48, "P 2 2 -1n", "-P 2ab 2bc", "P 2/n 2/n 2/n"),
    sg(49, "-P 2 2c", "P 2/c 2/c 2/m"),
    sg2(50, "P 2 2 -1ab", "-P 2ab 2b", "P 2/b 2/a 2/n"),
    sg(51, "-P 2a 2a", "P 21/m 2/m 2/a"),
    sg(52, "-P 2a 2bc", "P 2/n 21/n 2/a"),
    sg(53, "-P 2ac 2", "P 2/m 2/n 21/a"),
    sg(54, "-P 2a 2ac", "P 21/c 2/c 2/a"),
    sg(55, "-P 2 2ab", "P 21/b 21/a 2/m"),
    sg(56, "-P 2ab 2ac", "P 21/c 21/c 2/n"),
    sg(57, "-P 2c 2b", "P 2/b 21/c 21/m"),
    sg(58, "-P 2 2n", "P 21/n 21/n 2/m"),
    sg2(59, "P 2 2ab -1ab", "-P 2ab 2a", "P 21/m 21/m 2/n"),
    sg(60, "-P 2n 2ab", "P 21/b 2/c 21/n"),
    sg(61, "-P 2ac 2ab", "P 21/b 21/c 21/a"),
    sg(62, "-P 2ac 2n", "P 21/n 21/m 21/a"),
    sg(63, "-C 2c 2", "C 2/m 2/c 21/m"),
    sg(64, "-C 2bc 2", "C 2/m 2/c 21/a"),
    sg(65, "-C 2 2", "C 2/m 2/m 2/m"),
    sg(66, "-C 2 2c", "C 2/c 2/c 2/m"),
    sg(67, "-C 2b 2", "C 2/m 2/m 2/a"),
    sg2(68, "C 2 2 -1bc", "-C 2b 2bc", "C 2/c 2/c 2/a"),
    sg(69, "-F 2 2", "F 2/m 2/m 2/m"),
    sg2(70, "F 2 2 -1d", "-F 2uv 2vw", "F 2/d 2/d 2/d"),
    sg(71, "-I 2 2", "I 2/m 2/m 2/m"),
    sg(72, "-I 2 2c", "I 2/b 2/a 2/m"),
    sg(73, "-I 2b 2c", "I 21/b 21/c 21/a"),
    sg(74, "-I 2b 2", "I 21/m 21/m 21/a"),
    // tetragonal
    sg(75, "P 4", "P 4"),
    sg(76, "P 4w", "P 41"),
    sg(77, "P 4c", "P 42"),
    sg(78, "P 4cw", "P 43"),
    sg(79, "I 4", "I 4"),
    sg(80, "I 4bw", "I 41"),
    sg(81, "P -4", "P -4"),
    sg(82, "I -4", "I -4"),
    sg(83, "-P 4", "P 4/m"),
    sg(84, "-P 4c", "P 42/m"),
    sg2(85, "P 4ab -1ab", "-P 4a", "P 4/n"),
    sg2(86, "P 4n -1n", "-P 4bc", "P 42/n"),
    sg(87, "-I 4", "I 4/m"),
    sg2(88, "I 4bw -1bw", "-I 4ad", "I 41/a"),
    sg(89, "P 4 2", "P 4 2 2"),
    sg(90, "P 4ab 2ab", "P 4 21 2"),
    sg(91, "P 4w 2c", "P 41 2 2"),
    sg(92, "P 4abw 2nw", "P 41 21 2"),
    sg(93, "P 4c 2", "P 42 2 2"),
    sg(94, "P 4n 2n", "P 42 21 2"),
    sg(95, "P 4cw 2c", "P 43 2 2"),
    sg(96, "P 4nw 2abw", "P 43 21 2"),
    sg(97, "I 4 2", "I 4 2 2"),
    sg(98, "I 4bw 2bw", "I 41 2 2"),
    sg(99, "P 4 -2", "P 4 m m"),
    sg(100, "P 4 -2ab", "P 4 b m"),
    sg(101, "P 4c -2c", "P 42 c m"),
    sg(102, "P 4n -2n", "P 42 n m"),
    sg(103, "P 4 -2c", "P 4 c c"),
    sg(104, "P 4 -2n", "P 4 n c"),
    sg(105, "P 4c -2", "P 42 m c"),
    sg(106, "P 4c -2ab", "P 42 b c"),
    sg(107, "I 4 -2", "I 4 m m"),
    sg(108, "I 4 -2c", "I 4 c m"),
    sg(109, "I 4bw -2", "I 41 m d"),
    sg(110, "I 4bw -2c", "I 41 c d"),
    sg(111, "P -4 2", "P -4 2 m"),
    sg(112, "P -4 2c", "P -4 2 c"),
    sg(113, "P -4 2ab", "P -4 21 m"),
    sg(114, "P -4 2n", "P -4 21 c"),
    sg(115, "P -4 -2", "P -4 m 2"),
    sg(116, "P -4 -2c", "P -4 c 2"),
    sg(117, "P -4 -2ab", "P -4 b 2"),
    sg(118, "P -4 -2n", "P -4 n 2"),
    sg(119, "I -4 -2", "I -4 m 2"),
    sg(120, "I -4 -2c", "I -4 c 2"),
    sg(121, "I -4 2", "I -4 2 m"),
    sg(122, "I -4 2bw", "I -4 2 d"),
    sg(123, "-P 4 2", "P 4/m 2/m 2/m"),
    sg(124, "-P 4 2c", "P 4/m 2/c 2/c"),
    sg2(125, "P 4 2 -1ab", "-P 4a 2b", "P 4/n 2/b 2/m"),
    sg2(126, "P 4 2 -1n", "-P 4a 2bc", "P 4/n 2/n 2/c"),
    sg(127, "-P 4 2ab", "P 4/m 21/b 2/m"),
    sg(128, "-P 4 2n", "P 4/m 21/n 2/c"),
    sg2(129, "P 4ab 2ab -1ab", "-P 4a 2a", "P 4/n 21/m 2/m"),
    sg2(130, "P 4ab 2n -1ab", "-P 4a 2ac", "P 4/n 21/c 2/c"),
    sg(131, "-P 4c 2", "P 42/m 2/m 2/c"),
    sg(132, "-P 4c 2c", "P 42/m 2/c 2/m"),
    sg2(133, "P 4n 2c -1n", "-P 4ac 2b", "P 42/n 2/b 2/c"),
    sg2(134, "P 4n 2 -1n", "-P 4ac 2bc", "P 42/n 2/n 2/m"),
    sg(135, "-P 4c 2ab", "P 42/m 21/b 2/c"),
    sg(136, "-P 4n 2n", "P 42/m 21/n 2/m"),
    sg2(137, "P 4n 2n -1n", "-P 4ac 2a", "P 42/n 21/m 2/c"),
    sg2(138, "P 4n 2ab -1n", "-P 4ac 2ac", "P 42/n 21/c 2/m"),
    sg(139, "-I 4 2", "I 4/m 2/m 2/m"),
    sg(140, "-I 4 2c", "I 4/m 2/c 2/m"),
    sg2(141, "I 4bw 2bw -1bw", "-I 4bd 2", "I 41/a 2/m 2/d"),
    sg2(142, "I 4bw 2aw -1bw", "-I 4bd 2c", "I 41/a 2/c 2/d"),
    // trigonal
    sg(143, "P 3", "P 3"),
    sg(144, "P 31", "P 31"),
    sg(145, "P 32", "P 32"),
    sg2(146, "R 3", "P 3*", "R 3"),
    sg(147, "-P 3", "P -3"),
    sg2(148, "-R 3", "-P 3*", "R -3"),
    sg(149, "P 3 2", "P 3 1 2"),
    sg(150, "P 3 2\"", "P 3 2 1"),
    sg(151, "P 31 2c (0 0 1)", "P 31 1 2"),
    sg(152, "P 31 2\"", "P 31 2 1"),
    sg(153, "P 32 2c (0 0 -1)", "P 32 1 2"),
    sg(154, "P 32 2\"", "P 32 2 1"),
    sg2(155, "R 3 2\"", "P 3* 2", "R 3 2"),
    sg(156, "P 3 -2\"", "P 3 m 1"),
    sg(157, "P 3 -2", "P 3 1 m"),
    sg(158, "P 3 -2\"c", "P 3 c 1"),
    sg(159, "P 3 -2c", "P 3 1 c"),
    sg2(160, "R 3 -2\"", "P 3* -2", "R 3 m"),
    sg2(161, "R 3 -2\"c", "P 3* -2n", "R 3 c"),
    sg(162, "-P 3 2", "P -3 1 2/m"),
    sg(163, "-P 3 2c", "P -3 1 2/c"),
    sg(164, "-P 3 2\"", "P -3 2/m 1"),
    sg(165, "-P 3 2\"c", "P -3 2/c 1"),
    sg2(166, "-R 3 2\"", "-P 3* 2", "R -3 2/m"),
    sg2(167, "-R 3 2\"c", "-P 3* 2n", "R -3 2/c"),
    // hexagonal
    sg(168, "P 6", "P 6"),
    sg(169, "P 61", "P 61"),
    sg(170, "P 65", "P 65"),
    sg(171, "P 62", "P 62"),
    sg(172, "P 64", "P 64"),
    sg(173, "P 6c", "P 63"),
    sg(174, "P -6", "P -6"),
    sg(175, "-P 6", "P 6/m"),
    sg(176, "-P 6c", "P 63/m"),
    sg(177, "P 6 2", "P 6 2 2"),
    sg(178, "P 61 2 (0 0 -1)", "P 61 2 2"),
    sg(179, "P 65 2 (0 0 1)", "P 65 2 2"),
    sg(180, "P 62 2c (0 0 1)", "P 62 2 2"),
    sg(181, "P 64 2c (0 0 -1)", "P 64 2 2"),
    sg(182, "P 6c 2c", "P 63 2 2"),
    sg(183, "P 6 -2", "P 6 m m"),
    sg(184, "P 6 -2c", "P 6 c c"),
    sg(185, "P 6c -2", "P 63 c m"),
    sg(186, "P 6c -2c", "P 63 m c"),
    sg(187, "P -6 2", "P -6 m 2"),
    sg(188, "P -6c 2", "P -6 c 2"),
    sg(189, "P -6 -2", "P -6 2 m"),
    sg(190, "P -6c -2c", "P -6 2 c"),
    sg(191, "-P 6 2", "P 6/m 2/m 2/m"),
    sg(192, "-P 6 2c", "P 6/m 2/c 2/c"),
    sg(193, "-P 6c 2", "P 63/m 2/c 2/m"),
    sg(194, "-P 6c 2c", "P 63/m 2/m 2/c"),
    // cubic
    sg(195, "P 2 2 3", "P 2 3"),
    sg(196, "F 2 2 3", "F 2 3"),
    sg(197, "I 2 2 3", "I 2 3"),
    sg(198, "P 2ac 2ab 3", "P 21 3"),
    sg(199, "I 2b 2c 3", "I 21 3"),
    sg(200, "-P 2 2 3", "P 2/m -3"),
    sg2(201, "P 2 2 3 -1n", "-P 2ab 2bc 3", "P 2/n -3"),
    sg(202, "-F 2 2 3", "F 2/m -3"),
    sg2(203, "F 2 2 3 -1d", "-F 2uv 2vw 3", "F 2/d -3"),
    sg(204, "-I 2 2 3", "I 2/m -3"),
    sg(205, "-P 2ac 2ab 3", "P 21/a -3"),
    sg(206, "-I 2b 2c 3", "I 21/a -3"),
    sg(207, "P 4 2 3", "P 4 3 2"),
    sg(208, "P 4n 2 3", "P 42 3 2"),
    sg(209, "F 4 2 3", "F 4 3 2"),
    sg(210, "F 4d 2 3", "F 41 3 2"),
    sg(211, "I 4 2 3", "I 4 3 2"),
    sg(212, "P 4acd 2ab 3", "P 43 3 2"),
    sg(213, "P 4bd 2ab 3", "P 41 3 2"),
    sg(214, "I 4bd 2c 3", "I 41 3 2"),
    sg(215, "P -4 2 3", "P -4 3 m"),
    sg(216, "F -4 2 3", "F -4 3 m"),
    sg(217, "I -4 2 3", "I -4 3 m"),
    sg(218, "P -4n 2 3", "P -4 3 n"),
    sg(219, "F -4c 2 3", "F -4 3 c"),
    sg(220, "I -4bd 2c 3", "I -4 3 d"),
    sg(221, "-P 4 2 3", "P 4/m -3 2/m"),
    sg2(222, "P 4 2 3 -1n", "-P 4a 2bc 3", "P 4/n -3 2/n"),
    sg(223, "-P 4n 2 3", "P 42/m -3 2/n"),
    sg2(224, "P 4n 2 3 -1n", "-P 4bc 2bc 3", "P 42/n -3 2/m"),
    sg(225, "-F 4 2 3", "F 4/m -3 2/m"),
    sg(226, "-F 4c 2 3", "F 4/m -3 2/c"),
    sg2(227, "F 4d 2 3 -1d", "-F 4vw 2vw 3", "F 41/d -3 2/m"),
    sg2(228, "F 4d 2 3 -1cd", "-F 4cvw 2vw 3", "F 41/d -3 2/c"),
    sg(229, "-I 4 2 3", "I 4/m -3 2/m"),
    sg(230, "-I 4bd 2c 3", "I 41/a -3 2/d"),
];

/// Look up a table row by space-group number
pub fn entry(number: u16) -> Option<&'static SpaceGroupEntry> {
    if (1..=230).contains(&number) {
        Some(&SPACE_GROUPS[number as usize - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_number() {
        for (i, row) in SPACE_GROUPS.iter().enumerate() {
            assert_eq!(row.number as usize, i + 1);
        }
        assert!(entry(0).is_none());
        assert!(entry(231).is_none());
        assert_eq!(entry(225).map(|e| e.hermann_mauguin), Some("F 4/m -3 2/m"));
    }

    #[test]
    fn test_rhombohedral_groups_have_alternatives() {
        for n in RHOMBOHEDRAL_GROUPS {
            let row = entry(n).unwrap();
            assert!(row.hall_alternative.unwrap().contains('*'));
            assert!(row.hermann_mauguin.starts_with('R'));
        }
    }
}
