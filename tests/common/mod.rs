#![allow(dead_code)]
use std::fs;
use std::path::Path;
use vdjgen::{Model, RecombinationType};

pub const ANCHOR_HEADER: &str = "gene,anchor_index,function\n";

const UNIFORM_DINUCL: &str = "%0.25,0.25,0.25,0.25,0.25,0.25,0.25,0.25,\
                              0.25,0.25,0.25,0.25,0.25,0.25,0.25,0.25";

/// Files of a model, as strings
pub struct ModelStrings {
    pub params: String,
    pub marginals: String,
    pub v_anchors: String,
    pub j_anchors: String,
}

impl ModelStrings {
    pub fn load(&self, recombination: RecombinationType) -> Model {
        Model::load_from_str(
            &self.params,
            &self.marginals,
            &self.v_anchors,
            &self.j_anchors,
            recombination,
        )
        .unwrap()
    }

    pub fn write_to(&self, dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("model_params.txt"), &self.params).unwrap();
        fs::write(dir.join("model_marginals.txt"), &self.marginals).unwrap();
        fs::write(dir.join("V_gene_CDR3_anchors.csv"), &self.v_anchors).unwrap();
        fs::write(dir.join("J_gene_CDR3_anchors.csv"), &self.j_anchors).unwrap();
    }
}

/// VJ model with the given V genes `(name, sequence, anchor)` and a single
/// J gene TGGGGG (anchor 0). No deletion, no insertion, so every V gene
/// gives exactly one CDR3: V1 = GGGTGTGCC gives TGTGCCTGG (CAW).
pub fn vj_model_strings(vgenes: &[(&str, &str, Option<usize>)], p_v: &[f64]) -> ModelStrings {
    let mut params = String::from("@Event_list\n#GeneChoice;V_gene;Undefined_side;7;v_choice\n");
    for (ii, (name, seq, _)) in vgenes.iter().enumerate() {
        params += &format!("%{};{};{}\n", name, seq, ii);
    }
    params += "#GeneChoice;J_gene;Undefined_side;7;j_choice\n\
               %J1;TGGGGG;0\n\
               #Deletion;V_gene;Three_prime;5;v_3_del\n\
               %0;0\n\
               #Deletion;J_gene;Five_prime;5;j_5_del\n\
               %0;0\n\
               #Insertion;VJ_gene;Undefined_side;4;vj_ins\n\
               %0;0\n\
               #DinucMarkov;VJ_gene;Undefined_side;3;vj_dinucl\n\
               %T;3\n\
               %C;1\n\
               %G;2\n\
               %A;0\n\
               @Edges\n\
               %GeneChoice_V_gene_Undefined_side_prio7_size1;GeneChoice_J_gene_Undefined_side_prio7_size1\n\
               @ErrorRate\n\
               #SingleErrorRate\n\
               0\n";

    let nv = vgenes.len();
    let p_v = p_v
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let mut marginals = format!(
        "@v_choice\n$Dim[{}]\n#\n%{}\n@j_choice\n$Dim[{},1]\n",
        nv, p_v, nv
    );
    for ii in 0..nv {
        marginals += &format!("#[v_choice,{}]\n%1\n", ii);
    }
    marginals += &format!("@v_3_del\n$Dim[{},1]\n", nv);
    for ii in 0..nv {
        marginals += &format!("#[v_choice,{}]\n%1\n", ii);
    }
    marginals += "@j_5_del\n$Dim[1,1]\n#[j_choice,0]\n%1\n\
                  @vj_ins\n$Dim[1]\n#\n%1\n\
                  @vj_dinucl\n$Dim[16]\n#\n";
    marginals += UNIFORM_DINUCL;
    marginals += "\n";

    let mut v_anchors = String::from(ANCHOR_HEADER);
    for (name, _, anchor) in vgenes {
        if let Some(a) = anchor {
            v_anchors += &format!("{},{},F\n", name, a);
        }
    }
    ModelStrings {
        params,
        marginals,
        v_anchors,
        j_anchors: format!("{}J1,0,F\n", ANCHOR_HEADER),
    }
}

/// The simplest VJ model: always the CDR3 TGTGCCTGG (CAW) with V1 and J1
pub fn toy_vj_strings() -> ModelStrings {
    vj_model_strings(&[("V1", "GGGTGTGCC", Some(3))], &[1.])
}

pub fn toy_vj_model() -> Model {
    toy_vj_strings().load(RecombinationType::VJ)
}

const VDJ_PARAMS: &str = "@Event_list
#GeneChoice;V_gene;Undefined_side;7;v_choice
%TRBV1*01;GGGTGTGCCAGCAGC;0
%TRBV2*01;AAATGTGCCTGGAGT;1
#GeneChoice;J_gene;Undefined_side;7;j_choice
%TRBJ1*01;AACACTGAAGCTTTCTTTGGACAAGGC;0
%TRBJ2*01;CTCCTACGAGCAGTACTTCGGGCCG;1
#GeneChoice;D_gene;Undefined_side;6;d_gene
%TRBD1*01;GGGACAGGG;0
%TRBD2*01;GGACTAGCGGGAGGG;1
#Deletion;V_gene;Three_prime;5;v_3_del
%-2;0
%-1;1
%0;2
%1;3
%2;4
%3;5
#Deletion;D_gene;Five_prime;5;d_5_del
%-1;0
%0;1
%1;2
%2;3
#Deletion;D_gene;Three_prime;5;d_3_del
%-1;0
%0;1
%1;2
%2;3
#Deletion;J_gene;Five_prime;5;j_5_del
%-2;0
%-1;1
%0;2
%1;3
%2;4
%3;5
#Insertion;VD_genes;Undefined_side;4;vd_ins
%0;0
%1;1
%2;2
%3;3
%4;4
#Insertion;DJ_gene;Undefined_side;2;dj_ins
%0;0
%1;1
%2;2
%3;3
%4;4
#DinucMarkov;VD_genes;Undefined_side;3;vd_dinucl
%T;3
%C;1
%G;2
%A;0
#DinucMarkov;DJ_gene;Undefined_side;1;dj_dinucl
%T;3
%C;1
%G;2
%A;0
@Edges
%GeneChoice_V_gene_Undefined_side_prio7_size2;GeneChoice_J_gene_Undefined_side_prio7_size2
@ErrorRate
#SingleErrorRate
0.001
";

const VDJ_DELETIONS_AND_INSERTIONS: &str = "@v_3_del
$Dim[2,6]
#[v_choice,0]
%0.1,0.1,0.3,0.2,0.2,0.1
#[v_choice,1]
%0.05,0.15,0.4,0.2,0.1,0.1
@j_5_del
$Dim[2,6]
#[j_choice,0]
%0.1,0.1,0.4,0.2,0.1,0.1
#[j_choice,1]
%0.2,0.1,0.3,0.2,0.1,0.1
@d_5_del
$Dim[2,4]
#[d_gene,0]
%0.2,0.4,0.2,0.2
#[d_gene,1]
%0.1,0.5,0.3,0.1
@d_3_del
$Dim[2,4,4]
#[d_gene,0],[d_5_del,0]
%0.25,0.25,0.25,0.25
#[d_gene,0],[d_5_del,1]
%0.1,0.6,0.2,0.1
#[d_gene,0],[d_5_del,2]
%0.25,0.25,0.25,0.25
#[d_gene,0],[d_5_del,3]
%0.4,0.3,0.2,0.1
#[d_gene,1],[d_5_del,0]
%0.25,0.25,0.25,0.25
#[d_gene,1],[d_5_del,1]
%0.1,0.5,0.3,0.1
#[d_gene,1],[d_5_del,2]
%0.2,0.3,0.3,0.2
#[d_gene,1],[d_5_del,3]
%0.25,0.25,0.25,0.25
@vd_ins
$Dim[5]
#
%0.3,0.2,0.2,0.2,0.1
@dj_ins
$Dim[5]
#
%0.25,0.25,0.2,0.2,0.1
@vd_dinucl
$Dim[16]
#
%0.4,0.2,0.2,0.2,0.1,0.5,0.3,0.1,0.2,0.2,0.4,0.2,0.3,0.3,0.2,0.2
@dj_dinucl
$Dim[16]
#
%0.25,0.25,0.25,0.25,0.1,0.2,0.3,0.4,0.4,0.3,0.2,0.1,0.25,0.25,0.25,0.25
";

/// VDJ model with P(V) P(J) P(D|J) (OLGA-like marginals)
pub fn toy_vdj_strings() -> ModelStrings {
    let marginals = String::from(
        "@v_choice\n$Dim[2]\n#\n%0.6,0.4\n\
         @j_choice\n$Dim[2]\n#\n%0.5,0.5\n\
         @d_gene\n$Dim[2,2]\n#[j_choice,0]\n%0.7,0.3\n#[j_choice,1]\n%0.4,0.6\n",
    ) + VDJ_DELETIONS_AND_INSERTIONS;
    vdj_strings(marginals)
}

/// Same genes with P(V) P(J|V) P(D|V,J) (IGoR-like marginals)
pub fn toy_vdj_igor_strings() -> ModelStrings {
    let marginals = String::from(
        "@v_choice\n$Dim[2]\n#\n%0.6,0.4\n\
         @j_choice\n$Dim[2,2]\n#[v_choice,0]\n%0.5,0.5\n#[v_choice,1]\n%0.2,0.8\n\
         @d_gene\n$Dim[2,2,2]\n\
         #[v_choice,0],[j_choice,0]\n%0.7,0.3\n\
         #[v_choice,0],[j_choice,1]\n%0.4,0.6\n\
         #[v_choice,1],[j_choice,0]\n%0.5,0.5\n\
         #[v_choice,1],[j_choice,1]\n%0.1,0.9\n",
    ) + VDJ_DELETIONS_AND_INSERTIONS;
    vdj_strings(marginals)
}

fn vdj_strings(marginals: String) -> ModelStrings {
    ModelStrings {
        params: VDJ_PARAMS.to_string(),
        marginals,
        v_anchors: format!("{}TRBV1*01,3,F\nTRBV2*01,3,F\n", ANCHOR_HEADER),
        j_anchors: format!("{}TRBJ1*01,15,F\nTRBJ2*01,16,F\n", ANCHOR_HEADER),
    }
}

pub fn toy_vdj_model() -> Model {
    toy_vdj_strings().load(RecombinationType::VDJ)
}
