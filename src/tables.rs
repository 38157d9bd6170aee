//! Codec data tables.
//!
//! Trained codebooks, analysis windows, and filter coefficients shared by
//! the encoder and decoder. Q formats are noted per table; lookup tables
//! that can be derived from a codebook (the ascending search order of the
//! log-gain codebook and its next-higher-neighbor map) are built lazily at
//! first use instead of being stored.

use crate::constants::*;
use once_cell::sync::Lazy;

/// Asymmetric LPC analysis window, Q15 (120-sample rise, 40-sample fall).
pub static ANALYSIS_WINDOW: [i16; WINDOW_SIZE] = [
    6, 22, 50, 89, 139, 200, 272, 355,
    449, 554, 669, 795, 932, 1079, 1237, 1405,
    1583, 1771, 1969, 2177, 2395, 2622, 2858, 3104,
    3359, 3622, 3894, 4175, 4464, 4761, 5066, 5379,
    5699, 6026, 6361, 6702, 7050, 7404, 7764, 8130,
    8502, 8879, 9262, 9649, 10040, 10436, 10836, 11240,
    11647, 12058, 12471, 12887, 13306, 13726, 14148, 14572,
    14997, 15423, 15850, 16277, 16704, 17131, 17558, 17983,
    18408, 18831, 19252, 19672, 20089, 20504, 20916, 21325,
    21730, 22132, 22530, 22924, 23314, 23698, 24078, 24452,
    24821, 25185, 25542, 25893, 26238, 26575, 26906, 27230,
    27547, 27855, 28156, 28450, 28734, 29011, 29279, 29538,
    29788, 30029, 30261, 30483, 30696, 30899, 31092, 31275,
    31448, 31611, 31764, 31906, 32037, 32158, 32268, 32367,
    32456, 32533, 32600, 32655, 32700, 32733, 32755, 32767,
    32743, 32669, 32546, 32374, 32154, 31885, 31568, 31203,
    30792, 30334, 29831, 29283, 28690, 28055, 27377, 26658,
    25900, 25102, 24266, 23394, 22487, 21546, 20572, 19568,
    18534, 17472, 16384, 15271, 14136, 12979, 11802, 10608,
    9398, 8174, 6937, 5690, 4435, 3172, 1905, 635,
];

/// Gaussian lag window applied to r[1..=8], Q15 (60 Hz at 16 kHz).
pub static LAG_WINDOW: [i16; LPC_ORDER] = [
    32759, 32732, 32686, 32623, 32541, 32442, 32325, 32191,
];

/// Bandwidth expansion factors 0.96^i for a[1..=8], Q15.
pub static BW_EXPAND: [i16; LPC_ORDER] = [
    31457, 30199, 28991, 27831, 26718, 25649, 24623, 23638,
];

/// Short-term weighting decay 0.75^i for i = 0..=8, Q15.
pub static WEIGHT_DECAY: [i16; LPC_ORDER + 1] = [
    32767, 24576, 18432, 13824, 10368, 7776, 5832, 4374,
    3280,
];

/// 50 Hz high-pass filter numerator, Q13.
pub static HPF_B: [i16; 3] = [8079, -16158, 8079];

/// 50 Hz high-pass filter denominator, Q13.
pub static HPF_A: [i16; 3] = [8192, -16157, 7968];

/// 800 Hz low-pass numerator for the 8:1 pitch decimation, Q13.
pub static DEC_B: [i16; DEC_FILTER_ORDER + 1] = [3, 14, 20, 14, 3];

/// 800 Hz low-pass denominator for the 8:1 pitch decimation, Q13.
pub static DEC_A: [i16; DEC_FILTER_ORDER + 1] = [8192, -26056, 31631, -17303, 3590];

/// cos(pi * k / 128) for k = 0..=128, Q15.
pub static COS_TABLE: [i16; 129] = [
    32767, 32758, 32729, 32679, 32610, 32522, 32413, 32286,
    32138, 31972, 31786, 31581, 31357, 31114, 30853, 30572,
    30274, 29957, 29622, 29269, 28899, 28511, 28106, 27684,
    27246, 26791, 26320, 25833, 25330, 24812, 24279, 23732,
    23170, 22595, 22006, 21403, 20788, 20160, 19520, 18868,
    18205, 17531, 16846, 16151, 15447, 14733, 14010, 13279,
    12540, 11793, 11039, 10279, 9512, 8740, 7962, 7180,
    6393, 5602, 4808, 4011, 3212, 2411, 1608, 804,
    0, -804, -1608, -2411, -3212, -4011, -4808, -5602,
    -6393, -7180, -7962, -8740, -9512, -10279, -11039, -11793,
    -12540, -13279, -14010, -14733, -15447, -16151, -16846, -17531,
    -18205, -18868, -19520, -20160, -20788, -21403, -22006, -22595,
    -23170, -23732, -24279, -24812, -25330, -25833, -26320, -26791,
    -27246, -27684, -28106, -28511, -28899, -29269, -29622, -29957,
    -30274, -30572, -30853, -31114, -31357, -31581, -31786, -31972,
    -32138, -32286, -32413, -32522, -32610, -32679, -32729, -32758,
    -32768,
];

/// Long-term LSP mean vector, Q15 normalized frequency.
pub static LSP_MEAN: [i16; LPC_ORDER] = [
    2998, 6701, 10355, 13992, 17613, 21217, 24805, 28377,
];

/// Moving-average LSP predictor coefficients, Q14.
/// `LSP_PRED[i][k]` weights the k-frames-old quantized error of dimension i.
pub static LSP_PRED: [[i16; LSP_PRED_ORDER]; LPC_ORDER] = [
    [3665, 2984, 2164, 1412, 895, 628, 515, 446],
    [3826, 2442, 1578, 1169, 992, 851, 667, 464],
    [2828, 2213, 1913, 1604, 1208, 811, 512, 343],
    [3674, 2986, 2161, 1408, 893, 628, 517, 448],
    [3818, 2435, 1575, 1171, 995, 852, 667, 463],
    [2826, 2218, 1919, 1606, 1207, 809, 511, 343],
    [3684, 2988, 2158, 1404, 891, 629, 518, 449],
    [3809, 2427, 1573, 1173, 999, 854, 667, 462],
];

/// First-stage LSP error codebook, Q16.
pub static LSP_CB1: [[i16; LPC_ORDER]; LSP_CB1_SIZE] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [-1670, -24, 6267, 2150, 1780, 3222, -1419, 388],
    [-4730, -329, 174, 898, 214, -1347, 884, -6],
    [-544, 525, 1271, 1876, 973, -802, 126, -444],
    [924, 1645, 2617, 1401, 3417, -1523, 825, -1965],
    [3683, 3201, 3747, -99, 39, 1825, -1087, -2801],
    [-1260, -3017, -1229, -4485, 668, -1874, -1749, -277],
    [-84, -831, -654, -1493, -2951, -1912, -610, 841],
    [-1615, 604, 109, 226, 599, 217, -1640, 3013],
    [2503, -413, -3173, -1083, 989, -2731, -212, -447],
    [749, 2671, -3390, 2637, -1448, 2692, 599, 1451],
    [297, -398, 827, -601, 486, -1663, -515, -2160],
    [2090, -2313, -1311, -2387, 2117, 2023, -1747, -1641],
    [-129, 3507, -2754, 735, 785, -1444, -498, 1129],
    [-1773, -1553, -494, 1116, 5009, -887, -1244, 312],
    [-4721, -3444, -2449, -1319, -1087, 1200, 723, 874],
    [-1328, -1208, 84, 2584, -1177, 666, -580, -1102],
    [-2066, 1527, -2268, 3432, 4689, 754, 1925, -110],
    [-2990, -2299, -767, 11, 1892, -1216, -788, 1038],
    [1499, 661, -6010, 514, -4309, 719, -55, 1804],
    [-2406, -856, -1969, 534, 2072, -1999, -184, 1530],
    [8020, 679, -3151, -229, -2711, -1699, -1108, -2280],
    [-203, -1829, -2446, 4969, 626, 2739, -1015, 1495],
    [3355, 2420, -3993, 938, 9, 2911, 578, -576],
    [-1654, 198, -1206, 783, -1546, 1108, 1472, -2469],
    [2948, -2674, -4496, -2093, -185, -2170, -2535, -297],
    [388, 1017, -1876, -230, 155, 1754, 1735, -1340],
    [1333, -2326, -1644, -3892, -2162, -2201, -1758, -1872],
    [-4343, -2621, -3673, 106, 4098, -1591, -911, -1719],
    [-1529, -44, 1873, -407, 481, -651, -3562, -681],
    [2697, 2822, -2914, -515, -867, 4345, -700, -1012],
    [-5696, -3592, -1912, -1907, 1127, 366, 307, 19],
    [3248, 3105, 2125, -4979, 3738, -720, -608, -275],
    [3142, -618, -1044, 259, -2583, -167, 4261, -232],
    [2094, -4193, 1409, 1069, 245, -2317, 2718, 552],
    [-4396, 12, -504, 3544, 174, -427, -1002, -771],
    [-368, 929, 564, -1229, -1969, 706, 538, -133],
    [-1448, 1373, 996, -742, 3443, -291, 1054, -1360],
    [-4849, -2535, 29, 1884, -3519, -156, 742, 1137],
    [-2498, 1571, -3128, 2080, 4502, -1633, -1142, -642],
    [-7440, -1669, -2331, 1833, -498, -5968, -1251, 3458],
    [-836, -3743, -1077, 2586, -1234, 1975, -3090, -114],
    [-2447, 781, 2950, 488, 1741, 1506, -1602, -2914],
    [-3624, 815, 3037, 1598, 776, 3460, -2400, -2218],
    [-1121, -180, -3522, -1760, 4667, 5120, 39, 485],
    [2908, -157, -1478, -3191, 4068, -3745, 1683, 1355],
    [-3306, -3748, -401, -2154, -259, -1122, 2564, 2630],
    [-1683, -1296, -1854, -1395, 2308, -604, 688, -1799],
    [-2609, -2486, 2500, -5681, -585, 5373, 2146, -1681],
    [5180, -4098, 5410, 5828, -978, -1203, 1076, 29],
    [-2315, 3036, 2321, 3761, -3207, 3445, -121, -2587],
    [1714, 6599, -547, -21, 4252, -1443, -728, -2261],
    [-353, 567, -2152, -152, 33, -1769, 558, -758],
    [564, 2133, -559, 1442, 225, 736, 2895, -1861],
    [1692, 1052, -279, 1148, 1544, -946, 1422, 435],
    [2949, -2525, 1755, 1836, -1154, 810, -863, -113],
    [-824, 1252, -5386, 1161, 1491, 1955, -1935, -474],
    [662, -1535, -5837, 7040, 2798, -583, 3220, -1063],
    [3287, 2641, 2104, -3326, 2931, -1351, 191, -2653],
    [-2817, 1639, -1575, -1809, 4700, 4189, -3430, 1860],
    [-311, 4383, 420, -1199, -77, 570, -3144, 2831],
    [-628, 676, -5202, -387, -789, -1570, 1535, 325],
    [-1159, 166, 538, 234, -2382, -2004, -2507, -583],
    [-1568, -3634, -3407, 1696, 920, 665, 1445, 728],
    [-2138, 7919, -850, -2097, 229, -3191, 333, 720],
    [1180, 2391, -175, -3722, -3564, -3487, 113, 1001],
    [478, -90, 3463, -573, 2865, -563, 287, 3052],
    [-1651, -1239, 3262, 2029, -492, 2234, 136, -2380],
    [-437, 1476, -1005, 2584, -485, 2315, 1757, -2268],
    [3612, -2973, -1358, 2342, 3616, -105, -231, 795],
    [-2212, -2100, 2528, 626, -1130, -1539, -1758, -3145],
    [-4530, 219, 397, -1356, 3837, 909, 647, 330],
    [-1668, 193, -1362, -1511, 1825, 2207, -1908, -1724],
    [-1123, -806, 3296, 3021, -2144, -1131, -1791, 1302],
    [-3025, 6053, 2002, -630, 3898, -2183, 661, -609],
    [-801, 2899, -651, 1871, 3312, 552, -891, -4009],
    [-3317, 623, 1675, 481, 410, 2706, 1215, 1385],
    [3585, -1911, 1117, -3941, 3355, -1839, 309, 907],
    [-169, -606, 5182, -1223, 279, 3064, 3053, 3631],
    [-3139, -1118, -1747, 658, 2967, -1041, -1439, 484],
    [68, 1476, 5829, -4043, 1772, 410, -227, -739],
    [-4033, -84, 31, 1369, -2061, -965, -1982, 64],
    [-2391, -854, 640, -3075, -1091, 669, -1718, 822],
    [2350, 529, -402, -2134, 2801, -129, -304, -866],
    [-686, -602, -2688, -562, 388, -118, -1206, 131],
    [3741, 1062, 2662, -681, 1898, -64, -1138, 1922],
    [4971, -1277, 103, 3192, 174, -1103, 2558, 307],
    [-3934, 672, 1440, 1203, -1611, -1623, -238, -833],
    [-1285, -2451, -9943, 1979, 3197, 2217, -73, -1899],
    [-3753, 910, -791, 278, -3637, 818, 2053, -519],
    [-121, -379, -2884, 2636, 861, -1127, -1418, -157],
    [-2092, -2341, -3400, -1788, -1405, 122, 80, -454],
    [-1384, -3445, 333, 560, -436, 859, 1626, -2810],
    [1600, 538, 606, -2635, 1540, 337, -391, -1433],
    [3969, -506, -2377, -2753, 1816, -337, 1373, -610],
    [1739, 1285, -2273, 2322, 1626, 2407, 3040, 1607],
    [-887, -3334, -1412, -619, -807, -76, -471, -1602],
    [997, -1042, 3795, -1944, -323, -2476, -246, -438],
    [6379, 4032, -1321, -903, 3260, 424, 2104, -1449],
    [-2628, 4814, 2050, -7389, -3797, -1894, 3451, 2353],
    [-2560, 425, -1880, -3796, -290, -1507, -934, 1275],
    [-5774, 4667, 480, -2302, 2452, 4275, -475, 998],
    [-2187, -3608, 4599, 1335, -4953, -1365, -58, 2465],
    [-472, -191, 1447, -1506, -1016, 1160, 2444, -1496],
    [-2592, -2413, 2315, 2796, -1285, -625, -682, 2517],
    [653, -3325, 5000, -3079, -1474, -1631, 435, 2216],
    [6948, 1273, 2120, 1018, 2614, -203, -102, -577],
    [6629, -869, -1570, -151, -995, -3805, 2223, -86],
    [-217, 1772, -1118, 3989, -3340, 3120, 78, 1317],
    [-1518, 1009, 394, -2472, 1717, -1007, 2300, 2179],
    [1450, -3904, -3080, -5596, 2799, -774, -3823, 247],
    [-1340, 5394, -2418, -185, -2901, 305, -1164, 12],
    [-1718, -1207, -1700, -131, -2210, 765, 41, -363],
    [1552, 227, 5605, 750, -1935, -951, 49, -2604],
    [3344, 133, -849, -2962, -1880, -1537, 1350, 1651],
    [-398, -787, -2007, -1604, -322, -871, -255, 588],
    [-455, -3327, -3915, -1035, -2575, -1130, -2570, -800],
    [2387, 76, -427, 839, -2450, 1704, -381, 2419],
    [-714, -3578, -4018, 840, -1224, -1381, 782, -3055],
    [-2623, -5682, 1958, 2995, 4133, -2391, -228, 1071],
    [-1345, 3675, 1300, -3678, 3913, 3266, 520, 350],
    [2438, 5602, 1280, -1478, -1843, -2877, -732, 1781],
    [-469, 1952, -130, 1341, -682, -1313, -1700, 520],
    [-2611, -316, -288, -2744, 881, -475, 1303, 3167],
    [1547, -2964, 2332, -2737, -1344, -1923, -1348, 1116],
    [-3484, -309, -3643, -2078, 1285, 4456, 416, 1365],
    [620, -649, 530, 5178, -490, 479, 2609, -307],
    [625, -1058, 2384, -1612, -3699, 1320, -1246, 483],
];

/// Second-stage LSP codebook, low split (dimensions 0..3), Q19.
pub static LSP_CB21: [[i16; LSP_SPLIT1]; LSP_CB2_SIZE] = [
    [0, 0, 0],
    [-6950, 10955, -1571],
    [1786, 3221, -527],
    [7612, 762, 4565],
    [-1444, -126, -4429],
    [-12330, -4715, 1541],
    [3894, 4325, -6782],
    [-1320, 1575, -5519],
    [4859, 2395, -554],
    [-6759, -6833, 1843],
    [8048, -993, -3661],
    [-2451, -3222, -1637],
    [-1169, -11816, -418],
    [-2155, -10508, -1982],
    [15869, 13517, -904],
    [-8689, -3951, 4820],
    [5041, 5374, -8847],
    [5313, 12664, -8144],
    [2056, -2701, -3371],
    [-3785, -3923, 703],
    [2263, -3207, -7],
    [-218, -5162, 1374],
    [-4874, -3978, -5773],
    [617, -1695, 4466],
    [-5400, -2817, 2357],
    [-953, -9640, 4259],
    [3955, 5910, 9247],
    [5480, 4583, -10363],
    [-8658, -5895, -12291],
    [-9587, 1392, 9098],
    [-9507, 7508, 8001],
    [896, 4452, 3010],
];

/// Second-stage LSP codebook, high split (dimensions 3..8), Q19.
pub static LSP_CB22: [[i16; LSP_SPLIT2]; LSP_CB2_SIZE] = [
    [0, 0, 0, 0, 0],
    [6638, 4685, -3089, -2092, -608],
    [-534, 2861, -103, -650, 1991],
    [-225, -2895, -2046, -1004, 3621],
    [2273, 248, 112, -2534, -549],
    [2589, -6588, 4139, 7220, 3946],
    [-1115, 10443, -6444, -300, 5743],
    [-7063, -7340, -1411, 3215, -7014],
    [3231, 5538, -1186, 3552, 8655],
    [2896, 1127, -9642, -3594, 7565],
    [3561, -370, 1291, 3602, -1000],
    [-588, -68, -12199, 2228, 5624],
    [-4557, 4726, -3973, 4820, -8036],
    [-1498, -6677, 1331, 171, 2009],
    [4364, -5239, 3610, 4367, 7895],
    [-983, -1361, -1522, -2214, -5193],
    [-2580, 4508, -2790, 4335, -4211],
    [833, -2781, 1679, 8861, 360],
    [8504, -6459, -925, -5674, -12082],
    [1506, 1406, 6898, 3881, -155],
    [-4264, -5104, 5742, 6113, -944],
    [5520, 2117, -11834, 6367, -4919],
    [-1486, -6867, -2916, -3480, 8710],
    [-2859, 2176, -9295, -6, -6527],
    [-3466, -367, 1727, -5960, 4877],
    [-1242, -684, -580, -6379, -7508],
    [8721, -2932, 3203, 5029, 2607],
    [6752, -565, 4313, -4553, -2828],
    [-6137, -1363, -6505, 4383, 387],
    [2764, 3550, 656, -2256, 12354],
    [-1017, 2294, -1032, -4769, 57],
    [7692, 9051, -2520, -4947, 7672],
];

/// Moving-average log-gain predictor coefficients, Q15.
pub static LOG_GAIN_PRED: [i16; LOG_GAIN_PRED_ORDER] = [
    11141, 9136, 7491, 6143, 5037, 4130, 3387, 2777,
    2277, 1867, 1531, 1256, 1030, 844, 692, 568,
];

/// Long-term log-gain mean, Q11.
pub const LOG_GAIN_MEAN: i16 = 23450;

/// Log-gain prediction error codebook, Q11.
pub static LOG_GAIN_CB: [i16; LOG_GAIN_CB_SIZE] = [
    -9033, 4553, -4553, 7635, -6364, 9033, 8153, 9413,
    9763, 3250, -9413, 1373, -10669, -5553, -9763, -10933,
    10933, 7046, -8153, -7046, -3250, -1373, -10388, -7635,
    10388, 10087, -8615, 5553, 8615, 6364, 10669, -10087,
];

/// Maximum allowed log-gain increase, Q9, indexed by
/// `level_bin * GAIN_CHANGE_BINS + change_bin`.
pub static GAIN_CHANGE_LIMIT: [i16; GAIN_LEVEL_BINS * GAIN_CHANGE_BINS] = [
    5632, 5458, 5284, 5110, 4936, 4762, 4588, 4413,
    4239, 4065, 3891, 5366, 5192, 5018, 4844, 4669,
    4495, 4321, 4147, 3973, 3799, 3625, 5100, 4925,
    4751, 4577, 4403, 4229, 4055, 3881, 3707, 3533,
    3359, 4833, 4659, 4485, 4311, 4137, 3963, 3789,
    3615, 3441, 3267, 3092, 4567, 4393, 4219, 4045,
    3871, 3697, 3523, 3348, 3174, 3000, 2826, 4301,
    4127, 3953, 3779, 3604, 3430, 3256, 3082, 2908,
    2734, 2560, 4035, 3860, 3686, 3512, 3338, 3164,
    2990, 2816, 2642, 2468, 2294, 3768, 3594, 3420,
    3246, 3072, 2898, 2724, 2550, 2376, 2202, 2028,
    3502, 3328, 3154, 2980, 2806, 2632, 2458, 2284,
    2109, 1935, 1761, 3236, 3062, 2888, 2714, 2540,
    2365, 2191, 2017, 1843, 1669, 1495, 2970, 2796,
    2621, 2447, 2273, 2099, 1925, 1751, 1577, 1403,
    1229, 2703, 2529, 2355, 2181, 2007, 1833, 1659,
    1485, 1311, 1137, 963, 2437, 2263, 2089, 1915,
    1741, 1567, 1393, 1219, 1044, 870, 696, 2171,
    1997, 1823, 1649, 1475, 1300, 1126, 952, 778,
    604, 430, 1905, 1731, 1556, 1382, 1208, 1034,
    860, 686, 512, 338, 256, 1638, 1464, 1290,
    1116, 942, 768, 594, 420, 256, 256, 256,
    1372, 1198, 1024, 850, 676, 502, 328, 256,
    256, 256, 256, 1106, 932, 758, 584, 410,
    256, 256, 256, 256, 256, 256,
];

/// Excitation shape codebook, 32 unit-RMS vectors of dimension 4, Q13.
pub static SHAPE_CB: [[i16; VECTOR_DIM]; SHAPE_CB_SIZE] = [
    [8192, 8192, 8192, 8192],
    [8192, -8192, 8192, -8192],
    [-1683, 2775, 7969, -13943],
    [-8303, -8097, 11482, 1448],
    [-2421, -3229, 15397, -3882],
    [-421, -5284, -15482, 797],
    [-7942, -9617, 8826, 5914],
    [-1482, 12656, 9261, -4507],
    [6793, -3909, 12660, 6836],
    [-2149, 14334, 2524, -7210],
    [-13508, -2183, 470, -8999],
    [-736, -57, 16321, 1231],
    [6340, -11352, -5352, 8410],
    [-7924, -6677, -5139, -11604],
    [-3085, 12633, 8080, 5834],
    [8753, 4119, -11523, 6486],
    [-8688, -5330, -7701, -10258],
    [8733, -13117, -1290, 4295],
    [-3609, 11329, 9274, 6406],
    [-3156, 12393, 5939, 8344],
    [-4826, 9922, -5833, 10615],
    [7507, 929, 14040, 3753],
    [1293, 5852, -2811, -14987],
    [-3524, -2043, -13290, -8673],
    [1791, -2019, -10411, -12360],
    [13228, 2624, 641, 9282],
    [-1324, 245, -14906, 6666],
    [4772, -8396, 4462, -12460],
    [-49, -6597, 11425, 9715],
    [9394, -1629, 12053, -5679],
    [10387, -1586, -12171, 3144],
    [-4639, 13330, 4144, -7214],
];

/// Three-tap pitch predictor codebook, Q15. Entry 0 is all-zero.
pub static PITCH_TAP_CB: [[i16; 3]; PITCH_TAP_CB_SIZE] = [
    [0, 0, 0],
    [865, 1638, 6105],
    [-1325, 2643, -443],
    [56, 3648, -6359],
    [-2179, 4653, 5488],
    [4530, 5658, 729],
    [-965, 6663, -3567],
    [-5601, 7668, 1666],
    [6228, 8673, -854],
    [134, 9677, 2304],
    [-4996, 10682, -805],
    [3436, 11687, -4319],
    [-166, 12692, 5977],
    [-94, 13697, -525],
    [67, 14702, -5501],
    [-2942, 15707, 4910],
    [4808, 16712, -86],
    [-875, 17717, -2205],
    [-5208, 18721, 1458],
    [5725, 19726, -1828],
    [-396, 20731, 3003],
    [-3703, 21736, -679],
    [3021, 22741, -4408],
    [-1172, 23746, 5703],
    [958, 24751, -775],
    [104, 25756, -4462],
    [-3448, 26761, 4369],
    [4879, 27765, -972],
    [-916, 28770, -937],
    [-4557, 29775, 1322],
    [5187, 30780, -2625],
    [-1060, 31785, 3472],
];

/// Sub-multiple correlation thresholds for the coarse pitch search, Q15.
pub static SUBMULT_THRESH: [i16; 8] = [
    32767, 26214, 19661, 13107, 9830, 9830, 9830, 9830,
];

/// Indices of [`LOG_GAIN_CB`] sorted by ascending codeword value.
///
/// The quantizer walks this order so that stepping the ordinal index down
/// always moves to the next lower quantized gain.
pub static LOG_GAIN_ORDER: Lazy<[u8; LOG_GAIN_CB_SIZE]> = Lazy::new(|| {
    let mut ord: [u8; LOG_GAIN_CB_SIZE] = core::array::from_fn(|i| i as u8);
    ord.sort_by_key(|&i| LOG_GAIN_CB[i as usize]);
    ord
});

/// For each codeword of [`LOG_GAIN_CB`], the index of the next higher
/// codeword (the highest codeword maps to itself). Used by the decoder to
/// nudge silence-level gains off the codebook floor.
pub static LOG_GAIN_NEXT_HIGHER: Lazy<[u8; LOG_GAIN_CB_SIZE]> = Lazy::new(|| {
    let ord = &*LOG_GAIN_ORDER;
    let mut nh = [0u8; LOG_GAIN_CB_SIZE];
    for r in 0..LOG_GAIN_CB_SIZE {
        let next = if r + 1 < LOG_GAIN_CB_SIZE { r + 1 } else { r };
        nh[ord[r] as usize] = ord[next];
    }
    nh
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_window_shape() {
        // Rises to its peak at the 120-sample boundary, then falls.
        for n in 1..120 {
            assert!(ANALYSIS_WINDOW[n] >= ANALYSIS_WINDOW[n - 1]);
        }
        for n in 121..160 {
            assert!(ANALYSIS_WINDOW[n] <= ANALYSIS_WINDOW[n - 1]);
        }
        assert!(ANALYSIS_WINDOW[119] > 32000);
    }

    #[test]
    fn lsp_mean_is_ordered() {
        for i in 1..LPC_ORDER {
            assert!(LSP_MEAN[i] > LSP_MEAN[i - 1]);
        }
    }

    #[test]
    fn shape_cb_is_unit_rms() {
        // Q13 unit RMS: sum of squares of a row is close to 4 * 8192^2.
        for row in SHAPE_CB.iter() {
            let e: i64 = row.iter().map(|&c| c as i64 * c as i64).sum();
            let rms = ((e / 4) as f64).sqrt();
            assert!((rms - 8192.0).abs() < 820.0, "rms {rms}");
        }
    }

    #[test]
    fn log_gain_order_is_ascending() {
        let ord = &*LOG_GAIN_ORDER;
        for r in 1..LOG_GAIN_CB_SIZE {
            assert!(LOG_GAIN_CB[ord[r] as usize] >= LOG_GAIN_CB[ord[r - 1] as usize]);
        }
    }

    #[test]
    fn next_higher_moves_up() {
        let nh = &*LOG_GAIN_NEXT_HIGHER;
        for i in 0..LOG_GAIN_CB_SIZE {
            let j = nh[i] as usize;
            if j != i {
                assert!(LOG_GAIN_CB[j] >= LOG_GAIN_CB[i]);
            }
        }
    }

    #[test]
    fn gain_change_limit_monotone() {
        for i in 0..GAIN_LEVEL_BINS {
            for n in 1..GAIN_CHANGE_BINS {
                let k = i * GAIN_CHANGE_BINS + n;
                assert!(GAIN_CHANGE_LIMIT[k] <= GAIN_CHANGE_LIMIT[k - 1]);
            }
        }
    }

    #[test]
    fn cos_table_endpoints() {
        assert_eq!(COS_TABLE[0], 32767);
        assert_eq!(COS_TABLE[128], -32768);
        assert_eq!(COS_TABLE[64], 0);
    }
}
